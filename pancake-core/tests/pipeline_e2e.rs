//! Disk-backed all-vs-all runs through the pipeline driver.

use std::sync::atomic::AtomicBool;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

use pancake_core::pipeline::PipelineError;
use pancake_core::seeddb::SeedDbError;
use pancake_core::{
    extract_seeds, run_overlaps, PipelineParams, SeedDbReader, SeedDbWriter, SeedDbWriterParams,
    SeedParams, SeqDbReader, SeqDbWriter, SeqDbWriterParams,
};

const BASES: &[u8; 4] = b"ACGT";

fn random_seq(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| BASES[rng.gen_range(0..4)]).collect()
}

fn seed_params() -> SeedParams {
    SeedParams {
        k: 19,
        w: 10,
        use_hpc: false,
        max_hpc_len: 10,
        use_rc: true,
    }
}

/// Two 10 kb reads sharing a 6 kb block, written as a SeqDB + SeedDB pair.
fn build_dbs(dir: &TempDir, sp: &SeedParams) {
    let mut rng = StdRng::seed_from_u64(7);
    let core = random_seq(&mut rng, 6_000);
    let mut read_1 = random_seq(&mut rng, 4_000);
    read_1.extend_from_slice(&core);
    let mut read_2 = core.clone();
    read_2.extend_from_slice(&random_seq(&mut rng, 4_000));

    let prefix = dir.path().join("reads");
    let mut seq_writer = SeqDbWriter::new(&prefix, SeqDbWriterParams::default()).unwrap();
    seq_writer.add_sequence("read/1", &read_1).unwrap();
    seq_writer.add_sequence("read/2", &read_2).unwrap();
    seq_writer.finish().unwrap();

    let mut seq_reader = SeqDbReader::open(dir.path().join("reads.seqdb")).unwrap();
    let mut seed_writer =
        SeedDbWriter::new(&prefix, *sp, SeedDbWriterParams::default()).unwrap();
    for block_id in 0..seq_reader.index().num_blocks() {
        let block = seq_reader.load_block(block_id).unwrap();
        for seq in block.iter() {
            let seeds = extract_seeds(&seq.bases, seq.id, sp).unwrap();
            seed_writer.add_seeds(&seq.header, seq.len(), &seeds).unwrap();
        }
        seed_writer.mark_block_end();
    }
    seed_writer.finish().unwrap();
}

fn open_readers(dir: &TempDir) -> (SeqDbReader, SeedDbReader, SeqDbReader, SeedDbReader) {
    (
        SeqDbReader::open(dir.path().join("reads.seqdb")).unwrap(),
        SeedDbReader::open(dir.path().join("reads.seeddb")).unwrap(),
        SeqDbReader::open(dir.path().join("reads.seqdb")).unwrap(),
        SeedDbReader::open(dir.path().join("reads.seeddb")).unwrap(),
    )
}

#[test]
fn all_vs_all_finds_the_shared_block() {
    let dir = TempDir::new().unwrap();
    build_dbs(&dir, &seed_params());
    let (mut t_seq, mut t_seed, mut q_seq, mut q_seed) = open_readers(&dir);

    let mut results = Vec::new();
    run_overlaps(
        &mut t_seq,
        &mut t_seed,
        &mut q_seq,
        &mut q_seed,
        &PipelineParams::default(),
        &AtomicBool::new(false),
        |r| results.push(r),
    )
    .unwrap();

    // One result per query, in query order.
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].query_id, 0);
    assert_eq!(results[1].query_id, 1);

    // Self-hits are skipped by default, so each read overlaps only the other.
    let o01 = &results[0].overlaps;
    assert_eq!(o01.len(), 1);
    assert_eq!(o01[0].b_id, 1);
    assert!(o01[0].a_span() >= 5_900);
    assert!(o01[0].identity > 99.0);

    let o10 = &results[1].overlaps;
    assert_eq!(o10.len(), 1);
    assert_eq!(o10[0].b_id, 0);
    assert!(o10[0].b_span() >= 5_900);
}

#[test]
fn cancelled_run_produces_nothing() {
    let dir = TempDir::new().unwrap();
    build_dbs(&dir, &seed_params());
    let (mut t_seq, mut t_seed, mut q_seq, mut q_seed) = open_readers(&dir);

    let mut results = Vec::new();
    run_overlaps(
        &mut t_seq,
        &mut t_seed,
        &mut q_seq,
        &mut q_seed,
        &PipelineParams::default(),
        &AtomicBool::new(true),
        |r| results.push(r),
    )
    .unwrap();
    assert!(results.is_empty());
}

#[test]
fn mismatched_seed_params_are_rejected() {
    let dir = TempDir::new().unwrap();
    build_dbs(&dir, &seed_params());

    // A second DB pair seeded with a different k.
    let other_dir = TempDir::new().unwrap();
    let mut other_params = seed_params();
    other_params.k = 21;
    build_dbs(&other_dir, &other_params);

    let (mut t_seq, mut t_seed, _, _) = open_readers(&dir);
    let (_, _, mut q_seq, mut q_seed) = open_readers(&other_dir);

    let err = run_overlaps(
        &mut t_seq,
        &mut t_seed,
        &mut q_seq,
        &mut q_seed,
        &PipelineParams::default(),
        &AtomicBool::new(false),
        |_| {},
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::SeedDb(SeedDbError::Mismatch(_))
    ));
}
