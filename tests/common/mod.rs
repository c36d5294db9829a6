#![allow(dead_code)]

use std::fs;

use corpus::{CorpusHandle, CorpusMetadata, CorpusParams};
use korpus::{Explorer, KorpusConfig, StubBackend};
use tempfile::TempDir;

/// Baseline frequencies for most of the stub vocabulary; `brev` and `avis`
/// are left out so their relevance is undefined.
const BASELINE: &str = "og,9000\ni,8000\ndet,7000\nsom,6000\nen,5500\npå,5000\n\
havet,120\nfjellet,90\nbyen,300\nkongen,80\nfolket,150\nskipet,60\nvinter,110\n\
sommer,130\nkrig,70\nfred,65\narbeid,200\nskole,180\nkirke,140\nbonde,50\nfisk,95\ntog,85\n";

pub fn reference_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in ["generell.csv", "avis.csv", "bok.csv"] {
        fs::write(dir.path().join(name), BASELINE).unwrap();
    }
    dir
}

pub fn config(references: &TempDir) -> KorpusConfig {
    let mut cfg = KorpusConfig::default();
    cfg.explore.reference_dir = Some(references.path().to_path_buf());
    cfg
}

/// Explorer over a generated stub library. Keep the returned directory alive
/// for as long as the explorer is used.
pub fn explorer(per_type: usize) -> (Explorer<StubBackend>, TempDir) {
    explorer_with(StubBackend::generated(per_type))
}

pub fn explorer_with(backend: StubBackend) -> (Explorer<StubBackend>, TempDir) {
    let dir = reference_dir();
    let explorer = Explorer::new(backend, &config(&dir)).unwrap();
    (explorer, dir)
}

pub fn query(pairs: &[(&str, &str)]) -> CorpusHandle {
    let params = CorpusParams::from_pairs(pairs.iter().copied());
    CorpusHandle::from(CorpusMetadata::try_from(params).unwrap())
}
