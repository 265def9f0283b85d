//! On-disk round trips of the sequence and seed databases.

use std::fs;
use std::io::Write;

use tempfile::TempDir;

use pancake_core::seeddb::validate_paired;
use pancake_core::{
    extract_seeds, SeedDbIndex, SeedDbReader, SeedDbWriter, SeedDbWriterParams, SeedParams,
    SeqDbIndex, SeqDbReader, SeqDbWriter, SeqDbWriterParams,
};

const READ_1: &[u8] = b"ACGTACGGATTACAGGATCGATTACAGGACTACGGATTACAGGATCGTT";
const READ_2: &[u8] = b"TTGACCATTACGGANNACGGATTACAGGATCGATTACAGGACTACGGAT";
const READ_3: &[u8] = b"GGATCGATTACAGGACTACGGATTACAGGATCGATTACAGGACTACGTA";

fn build_seqdb(dir: &TempDir, compress: bool) {
    let params = SeqDbWriterParams {
        use_compression: compress,
        block_size: 0,
        ..Default::default()
    };
    let mut writer = SeqDbWriter::new(dir.path().join("db"), params).unwrap();
    writer.add_sequence("read/1", READ_1).unwrap();
    writer.add_sequence("read/2", READ_2).unwrap();
    writer.mark_block_end();
    writer.add_sequence("read/3", READ_3).unwrap();
    writer.finish().unwrap();
}

fn build_seeddb(dir: &TempDir, seed_params: &SeedParams) {
    let mut seq_reader = SeqDbReader::open(dir.path().join("db.seqdb")).unwrap();
    let mut writer = SeedDbWriter::new(
        dir.path().join("db"),
        *seed_params,
        SeedDbWriterParams::default(),
    )
    .unwrap();
    for block_id in 0..seq_reader.index().num_blocks() {
        let block = seq_reader.load_block(block_id).unwrap();
        for seq in block.iter() {
            let seeds = extract_seeds(&seq.bases, seq.id, seed_params).unwrap();
            writer.add_seeds(&seq.header, seq.len(), &seeds).unwrap();
        }
        writer.mark_block_end();
    }
    writer.finish().unwrap();
}

#[test]
fn seqdb_index_reserialization_is_byte_identical() {
    for compress in [true, false] {
        let dir = TempDir::new().unwrap();
        build_seqdb(&dir, compress);
        let text = fs::read_to_string(dir.path().join("db.seqdb")).unwrap();
        let index = SeqDbIndex::load(dir.path().join("db.seqdb")).unwrap();
        assert_eq!(index.to_string(), text);
    }
}

#[test]
fn seqdb_sequences_roundtrip_through_disk() {
    let dir = TempDir::new().unwrap();
    build_seqdb(&dir, true);
    let mut reader = SeqDbReader::open(dir.path().join("db.seqdb")).unwrap();
    assert_eq!(reader.get_sequence(0).unwrap().bases, READ_1);
    assert_eq!(reader.get_sequence(1).unwrap().bases, READ_2);
    assert_eq!(reader.get_sequence(2).unwrap().bases, READ_3);
}

#[test]
fn seeddb_index_reserialization_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    build_seqdb(&dir, true);
    build_seeddb(
        &dir,
        &SeedParams {
            k: 15,
            w: 5,
            ..Default::default()
        },
    );
    let text = fs::read_to_string(dir.path().join("db.seeddb")).unwrap();
    let index = SeedDbIndex::load(dir.path().join("db.seeddb")).unwrap();
    assert_eq!(index.to_string(), text);
}

#[test]
fn seeddb_known_index_reemits_identically() {
    // Hand-written index: 3 file lines, 7 sequence lines, 2 block lines.
    let text = "V\t0.1.0\n\
        P\tk=19,w=10,hpc=0,hpc_len=10,rc=1\n\
        F\t0\tdb.seeddb.0.seeds\t2\t480\n\
        F\t1\tdb.seeddb.1.seeds\t2\t320\n\
        F\t2\tdb.seeddb.2.seeds\t3\t480\n\
        S\t0\tr1\t0\t0\t160\t10000\t10\n\
        S\t1\tr2\t0\t160\t320\t12000\t20\n\
        S\t2\tr3\t1\t0\t160\t9000\t10\n\
        S\t3\tr4\t1\t160\t160\t9500\t10\n\
        S\t4\tr5\t2\t0\t160\t9100\t10\n\
        S\t5\tr6\t2\t160\t160\t8000\t10\n\
        S\t6\tr7\t2\t320\t160\t7000\t10\n\
        B\t0\t0\t4\t800\n\
        B\t1\t4\t7\t480\n";
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("known.seeddb");
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
    drop(file);

    let index = SeedDbIndex::load(&path).unwrap();
    assert_eq!(index.file_lines.len(), 3);
    assert_eq!(index.seeds_lines.len(), 7);
    assert_eq!(index.block_lines.len(), 2);
    assert_eq!(index.to_string(), text);
}

#[test]
fn rederiving_seeds_from_the_seqdb_matches_the_seeddb() {
    let seed_params = SeedParams {
        k: 13,
        w: 4,
        ..Default::default()
    };
    let dir = TempDir::new().unwrap();
    build_seqdb(&dir, true);
    build_seeddb(&dir, &seed_params);

    let mut seq_reader = SeqDbReader::open(dir.path().join("db.seqdb")).unwrap();
    let mut seed_reader = SeedDbReader::open(dir.path().join("db.seeddb")).unwrap();
    assert_eq!(seed_reader.index().params, seed_params);

    for seq_id in 0..seq_reader.index().num_sequences() {
        let seq = seq_reader.get_sequence(seq_id).unwrap();
        let rederived = extract_seeds(&seq.bases, seq_id, &seed_params).unwrap();
        assert_eq!(seed_reader.get_seeds(seq_id).unwrap(), rederived);
    }
}

#[test]
fn paired_validation_detects_divergence() {
    let dir = TempDir::new().unwrap();
    build_seqdb(&dir, true);
    build_seeddb(&dir, &SeedParams::default());

    let seqdb = SeqDbIndex::load(dir.path().join("db.seqdb")).unwrap();
    let mut seeddb = SeedDbIndex::load(dir.path().join("db.seeddb")).unwrap();
    assert!(validate_paired(&seqdb, &seeddb).is_ok());

    seeddb.seeds_lines[1].header = "someone/else".to_string();
    assert!(validate_paired(&seqdb, &seeddb).is_err());

    let mut truncated = SeedDbIndex::load(dir.path().join("db.seeddb")).unwrap();
    truncated.seeds_lines.pop();
    assert!(validate_paired(&seqdb, &truncated).is_err());
}
