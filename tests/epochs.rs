use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use tempfile::tempdir;
use tootscrap::config::Layout;
use tootscrap::epoch::{epoch_start, resolve_next_epoch};
use tootscrap::post::Post;
use tootscrap::process::{combine_checkpoints, Harvester};
use tootscrap::request::{SearchApi, SearchParams};
use tootscrap::table::Table;
use tootscrap::{Error, Result};

/// Serves a fixed set of ids per hashtag, honouring the exclusive bounds and limit.
#[derive(Default)]
struct FakeTimeline {
    ids: HashMap<String, Vec<u128>>,
    calls: Mutex<Vec<(String, SearchParams)>>,
}

impl FakeTimeline {
    fn with(mut self, tag: &str, ids: &[u128]) -> Self {
        self.ids.insert(tag.to_string(), ids.to_vec());
        self
    }

    fn calls(&self) -> Vec<(String, SearchParams)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchApi for FakeTimeline {
    async fn search(&self, query: &str, params: SearchParams) -> Result<Vec<Post>> {
        self.calls.lock().unwrap().push((query.to_string(), params));

        let mut ids: Vec<u128> = self
            .ids
            .get(query)
            .into_iter()
            .flatten()
            .copied()
            .filter(|id| params.min_id.map_or(true, |min| *id > min))
            .filter(|id| params.max_id.map_or(true, |max| *id < max))
            .collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        ids.truncate(params.limit as usize);

        Ok(ids
            .into_iter()
            .map(|id| {
                serde_json::from_value(json!({
                    "id": id.to_string(),
                    "content": format!("<p>#{query}</p>"),
                    "reblogs_count": 0,
                }))
                .unwrap()
            })
            .collect())
    }
}

const E1: u128 = 100_000_000_000_000_000;
const E2: u128 = 101_000_000_000_000_000;

#[tokio::test]
async fn consecutive_epochs_write_consecutive_checkpoints() {
    let dir = tempdir().unwrap();
    let layout = Layout::new(dir.path());
    fs::create_dir_all(layout.epochs_dir()).unwrap();
    fs::write(layout.epochs_dir().join("0.csv"), "id\n5\n").unwrap();

    let api = FakeTimeline::default()
        .with("rust", &[E1 + 1, E2 + 1])
        .with("tokio", &[E2 + 7]);
    let mut harvester = Harvester::new(api, layout.clone());
    harvester.set_queries(["rust", "tokio"]);

    let outcomes = harvester.run_epochs(2, 40).await.unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].epoch, 1);
    assert_eq!(outcomes[0].start_id, E1);
    assert_eq!(outcomes[1].epoch, 2);
    assert_eq!(outcomes[1].start_id, E2);
    assert!(layout.epochs_dir().join("1.csv").exists());
    assert!(layout.epochs_dir().join("2.csv").exists());
    assert_eq!(resolve_next_epoch(layout.epochs_dir()).unwrap(), 3);

    // Epoch 1 starts at E1 inclusive, so every id from E1 upward is in range.
    assert_eq!(outcomes[0].rows, 3);
    // Epoch 2 starts at E2 and no longer sees the E1 post.
    assert_eq!(outcomes[1].rows, 2);

    let calls = harvester.api().calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0].1.min_id, Some(E1 - 1));
    assert_eq!(calls[0].1.max_id, None);
    assert_eq!(calls[2].1.min_id, Some(E2 - 1));
}

#[tokio::test]
async fn first_epoch_has_no_lower_bound() {
    let dir = tempdir().unwrap();
    let layout = Layout::new(dir.path());
    let mut harvester = Harvester::new(FakeTimeline::default().with("rust", &[3]), layout.clone());
    harvester.set_queries(["rust"]);

    let outcome = harvester.run_one_epoch(20).await.unwrap();
    assert_eq!(outcome.epoch, 0);
    assert_eq!(outcome.start_id, epoch_start(0));
    assert_eq!(outcome.checkpoint, Some(layout.epochs_dir().join("0.csv")));
    assert_eq!(harvester.api().calls()[0].1.min_id, None);
}

#[tokio::test]
async fn empty_epoch_leaves_no_checkpoint_and_is_repeated() {
    let dir = tempdir().unwrap();
    let layout = Layout::new(dir.path());
    let mut harvester = Harvester::new(FakeTimeline::default().with("quiet", &[]), layout.clone());
    harvester.set_queries(["quiet", "unknown"]);

    let outcomes = harvester.run_epochs(2, 20).await.unwrap();
    assert!(outcomes.iter().all(|o| o.epoch == 0 && o.checkpoint.is_none()));
    assert!(!layout.epochs_dir().exists());
    assert_eq!(resolve_next_epoch(layout.epochs_dir()).unwrap(), 0);
}

#[tokio::test]
async fn limit_reaches_the_server_clamped() {
    let dir = tempdir().unwrap();
    let mut harvester = Harvester::new(FakeTimeline::default(), Layout::new(dir.path()));
    harvester.set_queries(["a"]);

    harvester.run_one_epoch(100).await.unwrap();
    harvester.run_one_epoch(-5).await.unwrap();
    let limits: Vec<u8> = harvester.api().calls().iter().map(|(_, p)| p.limit).collect();
    assert_eq!(limits, [40, 0]);
}

#[test]
fn combine_keeps_first_file_row_and_sorts_ids() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("0.csv"), "id,src\n3,a\n1,a\n2,a\n").unwrap();
    fs::write(dir.path().join("1.csv"), "id,src\n5,b\n3,b\n4,b\n").unwrap();

    let combined = combine_checkpoints(dir.path(), "id").unwrap();
    assert_eq!(combined.column("id").unwrap(), ["1", "2", "3", "4", "5"]);
    assert_eq!(combined.column("src").unwrap(), ["a", "a", "a", "b", "b"]);

    let on_disk = Table::read_csv(dir.path().join("combined_epochs.csv")).unwrap();
    assert_eq!(on_disk, combined);

    // Running again must not fold the archive into itself.
    let again = combine_checkpoints(dir.path(), "id").unwrap();
    assert_eq!(again, combined);
}

#[test]
fn combine_skips_unusable_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("0.csv"), "").unwrap();
    fs::write(dir.path().join("1.csv"), "id,content\n,\n").unwrap();
    fs::write(dir.path().join("2.csv"), "id,content\n7,x\n").unwrap();

    let combined = combine_checkpoints(dir.path(), "id").unwrap();
    assert_eq!(combined.len(), 1);
}

#[test]
fn combine_errors_are_distinct() {
    let empty = tempdir().unwrap();
    assert!(matches!(
        combine_checkpoints(empty.path(), "id"),
        Err(Error::NoCheckpointFiles(_))
    ));

    let blank = tempdir().unwrap();
    fs::write(blank.path().join("0.csv"), "").unwrap();
    assert!(matches!(
        combine_checkpoints(blank.path(), "id"),
        Err(Error::NoUsableData(_))
    ));
}
