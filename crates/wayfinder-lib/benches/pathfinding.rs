use criterion::{criterion_group, criterion_main, Criterion};
use once_cell::sync::Lazy;
use std::hint::black_box;
use wayfinder_lib::{
    compute_route, Building, CoordinateSystem, Edge, EdgeKind, GeoPoint, Location, Node, NodeId,
    PlanarPoint, RouteRequest,
};

const FLOORS: i32 = 4;
const SIDE: i64 = 40;
const SPACING: f64 = 4.0;

fn node_id(floor: i32, row: i64, col: i64) -> NodeId {
    floor as i64 * SIDE * SIDE + row * SIDE + col
}

/// Grid floors joined by a stairwell in one corner and an elevator in the other.
fn grid_building() -> Building {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut locations = Vec::new();
    let mut next_edge = 0;
    let mut push_edge = |source, target, cost, floor, kind: EdgeKind, label: Option<&str>| {
        next_edge += 1;
        edges.push(Edge {
            id: next_edge,
            source,
            target,
            cost,
            reverse_cost: Some(cost),
            floor,
            kind,
            label: label.map(str::to_string),
            geometry: Vec::new(),
        });
    };

    for floor in 0..FLOORS {
        for row in 0..SIDE {
            for col in 0..SIDE {
                let id = node_id(floor, row, col);
                nodes.push(Node {
                    id,
                    floor,
                    position: PlanarPoint::new(col as f64 * SPACING, row as f64 * SPACING),
                });
                if col + 1 < SIDE {
                    push_edge(
                        id,
                        node_id(floor, row, col + 1),
                        SPACING,
                        floor,
                        EdgeKind::Corridor,
                        None,
                    );
                }
                if row + 1 < SIDE {
                    push_edge(
                        id,
                        node_id(floor, row + 1, col),
                        SPACING,
                        floor,
                        EdgeKind::Corridor,
                        None,
                    );
                }
            }
        }
        if floor + 1 < FLOORS {
            push_edge(
                node_id(floor, 0, 0),
                node_id(floor + 1, 0, 0),
                12.0,
                floor,
                EdgeKind::Stairs,
                None,
            );
            push_edge(
                node_id(floor, SIDE - 1, SIDE - 1),
                node_id(floor + 1, SIDE - 1, SIDE - 1),
                30.0,
                floor,
                EdgeKind::Elevator,
                None,
            );
        }
        for (row, col) in [(0, SIDE - 1), (SIDE - 1, 0), (SIDE / 2, SIDE / 2)] {
            locations.push(Location {
                node_id: node_id(floor, row, col),
                label: "Restroom".to_string(),
                category: "amenity".to_string(),
                floor,
            });
        }
    }
    locations.push(Location {
        node_id: node_id(0, SIDE / 2, 0),
        label: "Main Entrance".to_string(),
        category: "entrance".to_string(),
        floor: 0,
    });
    locations.push(Location {
        node_id: node_id(FLOORS - 1, SIDE / 2, SIDE - 1),
        label: "Lecture Hall".to_string(),
        category: "classroom".to_string(),
        floor: FLOORS - 1,
    });

    Building::from_parts(nodes, locations, edges, CoordinateSystem::Local)
        .expect("synthetic building is valid")
}

static BUILDING: Lazy<Building> = Lazy::new(grid_building);

fn benchmark_pathfinding(c: &mut Criterion) {
    let building = &*BUILDING;

    c.bench_function("single_pair_across_floors", |b| {
        let request = RouteRequest::new("Main Entrance", "Lecture Hall");
        b.iter(|| {
            let route = compute_route(building, &request).expect("route exists");
            black_box(route.total_cost)
        });
    });

    c.bench_function("single_pair_avoid_stairs", |b| {
        let request = RouteRequest::new("Main Entrance", "Lecture Hall").avoid_stairs(true);
        b.iter(|| {
            let route = compute_route(building, &request).expect("route exists");
            black_box(route.segment_count())
        });
    });

    c.bench_function("multi_candidate_restroom", |b| {
        let request = RouteRequest::new("Lecture Hall", "Restroom");
        b.iter(|| {
            let route = compute_route(building, &request).expect("route exists");
            black_box(route.end_node)
        });
    });

    c.bench_function("tie_break_restroom", |b| {
        let request =
            RouteRequest::new("Main Entrance", "Restroom").with_end_tie_break(GeoPoint::new(
                (SIDE - 1) as f64 * SPACING,
                0.0,
            ));
        b.iter(|| {
            let route = compute_route(building, &request).expect("route exists");
            black_box(route.end_node)
        });
    });
}

criterion_group!(benches, benchmark_pathfinding);
criterion_main!(benches);
