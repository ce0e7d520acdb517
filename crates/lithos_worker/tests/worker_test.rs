//! # Worker Protocol Tests
//!
//! Drives a real worker thread through the message protocol.

use std::collections::HashMap;
use std::time::Duration;

use lithos_procedural::schematic::Tag;
use lithos_procedural::{BlockPos, BlockRegistry, ChunkCoord, ModificationRecord, WorldConfig, AIR};
use lithos_worker::{RequestId, Response, ResponseBody, SchematicMetadata, WorkerError, WorkerHandle};

const WAIT: Duration = Duration::from_secs(30);

fn next(worker: &WorkerHandle) -> Response {
    worker.recv_timeout(WAIT).expect("worker response")
}

/// Collects responses until every id in `ids` has answered once.
fn collect(worker: &WorkerHandle, ids: &[RequestId]) -> HashMap<RequestId, Response> {
    let mut seen = HashMap::new();
    while seen.len() < ids.len() {
        let response = next(worker);
        assert!(ids.contains(&response.request), "unexpected response {response:?}");
        seen.insert(response.request, response);
    }
    seen
}

fn started(seed: u64) -> WorkerHandle {
    let worker = WorkerHandle::spawn().unwrap();
    worker.init(seed, WorldConfig::default(), BlockRegistry::default()).unwrap();
    assert!(matches!(next(&worker).body, ResponseBody::Initialized));
    worker
}

fn brick_schematic() -> Vec<u8> {
    Tag::Compound(
        [
            ("Version".to_owned(), Tag::Int(2)),
            ("Width".to_owned(), Tag::Short(1)),
            ("Height".to_owned(), Tag::Short(2)),
            ("Length".to_owned(), Tag::Short(1)),
            (
                "Palette".to_owned(),
                Tag::Compound([("minecraft:bricks".to_owned(), Tag::Int(0))].into_iter().collect()),
            ),
            ("BlockData".to_owned(), Tag::ByteArray(vec![0, 0])),
        ]
        .into_iter()
        .collect(),
    )
    .to_bytes("Schematic")
}

#[test]
fn test_generate_before_init_reports_error() {
    let worker = WorkerHandle::spawn().unwrap();
    let id = worker.generate_chunk(ChunkCoord::new(0, 0, 0)).unwrap();
    let response = next(&worker);
    assert_eq!(response.request, id);
    match response.body {
        ResponseBody::Error(message) => assert_eq!(message, WorkerError::NotInitialized.to_string()),
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn test_worker_survives_bad_requests() {
    let worker = started(3);

    worker.update_block(ChunkCoord::new(0, 0, 0), (99, 0, 0), 1).unwrap();
    assert!(matches!(next(&worker).body, ResponseBody::Error(_)));

    worker.load_schematic("junk", vec![0x1f, 0x8b], SchematicMetadata::default()).unwrap();
    assert!(matches!(next(&worker).body, ResponseBody::SchematicError { .. }));

    let id = worker.generate_chunk(ChunkCoord::new(0, 2, 0)).unwrap();
    let response = next(&worker);
    assert_eq!(response.request, id);
    assert!(matches!(response.body, ResponseBody::ChunkGenerated(_)));
}

#[test]
fn test_many_chunks_matched_by_id() {
    let worker = started(11);
    let coords: Vec<ChunkCoord> = (-2..2).flat_map(|x| (0..4).map(move |y| ChunkCoord::new(x, y, 1))).collect();
    let ids: Vec<RequestId> = coords.iter().map(|&c| worker.generate_chunk(c).unwrap()).collect();

    let responses = collect(&worker, &ids);
    for (id, coord) in ids.iter().zip(&coords) {
        let chunk = responses[id].chunk().expect("chunk response");
        assert_eq!(chunk.coord, *coord);
        assert!(worker.is_loaded(*coord));
    }
}

#[test]
fn test_block_query_defaults_to_air_until_loaded() {
    let worker = started(5);
    // Bedrock sits at y = 0.
    assert_eq!(worker.block_at(0, 0, 0), AIR);

    worker.generate_chunk(ChunkCoord::new(0, 0, 0)).unwrap();
    let response = next(&worker);
    let chunk = response.chunk().unwrap();
    assert_eq!(worker.block_at(0, 0, 0), chunk.get(0, 0, 0));
    assert_ne!(worker.block_at(0, 0, 0), AIR);

    worker.unload_chunk(ChunkCoord::new(0, 0, 0)).unwrap();
    worker.export_modifications().unwrap();
    let _ = next(&worker);
    assert_eq!(worker.block_at(0, 0, 0), AIR);
}

#[test]
fn test_edit_then_regenerate_keeps_edit() {
    let worker = started(1);
    let coord = ChunkCoord::new(0, 0, 0);

    worker.generate_chunk(coord).unwrap();
    let _ = next(&worker);

    worker.update_block(coord, (5, 10, 5), 3).unwrap();
    let updated = next(&worker);
    assert!(matches!(updated.body, ResponseBody::ChunkUpdated(_)));
    assert_eq!(worker.block_at(5, 10, 5), 3);

    worker.generate_chunk(coord).unwrap();
    let regenerated = next(&worker);
    assert_eq!(regenerated.chunk().unwrap().get(5, 10, 5), 3);
}

#[test]
fn test_bulk_import_before_init_applies_after() {
    let worker = WorkerHandle::spawn().unwrap();
    let pos = BlockPos::new(-3, 7, 40);
    worker.apply_modifications(vec![ModificationRecord::new(pos, 22)]).unwrap();
    worker.init(9, WorldConfig::default(), BlockRegistry::default()).unwrap();
    worker.generate_chunk(pos.chunk()).unwrap();

    // Nothing cached at import time, so the first response is Initialized.
    assert!(matches!(next(&worker).body, ResponseBody::Initialized));
    let chunk = next(&worker);
    assert_eq!(chunk.chunk().unwrap().get_world(pos), Some(22));
}

#[test]
fn test_export_is_verbatim() {
    let worker = started(2);
    let records = vec![
        ModificationRecord::new(BlockPos::new(0, 1, 2), 4),
        ModificationRecord::new(BlockPos::new(-50, 60, 7), 5),
    ];
    worker.apply_modifications(records.clone()).unwrap();
    worker.update_block(ChunkCoord::new(0, 0, 0), (0, 1, 2), 9).unwrap();
    worker.export_modifications().unwrap();

    match next(&worker).body {
        ResponseBody::Modifications(exported) => {
            let mut expected = vec![records[1], ModificationRecord::new(BlockPos::new(0, 1, 2), 9)];
            expected.sort_by_key(|r| r.pos);
            assert_eq!(exported, expected);
        }
        other => panic!("expected modifications, got {other:?}"),
    }
}

#[test]
fn test_schematic_load_echoes_metadata() {
    let worker = started(4);
    let metadata = SchematicMetadata {
        y_offset: Some(1),
        source: Some("structures/pillar.schem".to_owned()),
    };
    worker.load_schematic("pillar", brick_schematic(), metadata.clone()).unwrap();

    match next(&worker).body {
        ResponseBody::SchematicLoaded {
            success,
            name,
            metadata: echoed,
        } => {
            assert!(success);
            assert_eq!(name, "pillar");
            assert_eq!(echoed, metadata);
        }
        other => panic!("expected schematic loaded, got {other:?}"),
    }
}
