use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{error, warn};

use crate::config::{query_file_stem, Layout};
use crate::epoch::{checkpoint_path, csv_files, epoch_start, resolve_next_epoch};
use crate::request::{SearchApi, SearchParams};
use crate::table::Table;
use crate::{info_time, Error, Result, COMBINED_STEM};

/// What a single epoch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochOutcome {
    pub epoch: u64,
    pub start_id: u128,
    pub rows: usize,
    /// `None` when every query came back empty and nothing was written.
    pub checkpoint: Option<PathBuf>,
}

/// Drives searches against a [`SearchApi`] and keeps the results on disk.
///
/// Everything runs sequentially: each request is awaited before the next is sent.
pub struct Harvester<A> {
    api: A,
    layout: Layout,
    queries: Vec<String>,
}

impl<A: SearchApi> Harvester<A> {
    pub fn new(api: A, layout: Layout) -> Self {
        Self {
            api,
            layout,
            queries: Vec::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    pub fn set_queries(&mut self, queries: impl IntoIterator<Item = impl Into<String>>) {
        self.queries = queries.into_iter().map(Into::into).collect();
    }

    /// Loads queries from a text file, one per line. A missing file is logged
    /// and leaves the harvester with no queries.
    pub fn load_queries(&mut self, path: impl AsRef<Path>) -> Result<&[String]> {
        let path = path.as_ref();
        self.queries = match std::fs::read_to_string(path) {
            Ok(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                error!("File {} not found.", path.display());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        info_time!("Loaded {} queries from {}", self.queries.len(), path.display());
        Ok(&self.queries)
    }

    async fn fetch(
        &self,
        query: &str,
        posts_per_query: i64,
        start_id: Option<u128>,
        end_id: Option<u128>,
    ) -> Result<Table> {
        let params = SearchParams::from_inclusive(posts_per_query, start_id, end_id);
        let posts = self.api.search(query, params).await?;
        let table = Table::from_posts(&posts);
        info_time!("Finished searching for query \"{}\" with {} results", query, table.len());
        Ok(table)
    }

    /// Searches one query and saves the result as `<base>/<query>.csv`.
    /// `start_id` and `end_id` are inclusive.
    pub async fn search_one_query(
        &self,
        query: &str,
        posts_per_query: i64,
        start_id: Option<u128>,
        end_id: Option<u128>,
    ) -> Result<Table> {
        let table = self.fetch(query, posts_per_query, start_id, end_id).await?;
        save_csv(
            &table,
            &self.layout.base_dir().join(format!("{}.csv", query_file_stem(query))),
        )?;
        Ok(table)
    }

    /// Runs [`Self::search_one_query`] for every loaded query and returns the
    /// usable results stacked together.
    pub async fn search_list_of_queries(
        &self,
        posts_per_query: i64,
        start_id: Option<u128>,
        end_id: Option<u128>,
    ) -> Result<Table> {
        let mut tables = Vec::with_capacity(self.queries.len());
        for query in &self.queries {
            let table = self
                .search_one_query(query, posts_per_query, start_id, end_id)
                .await?;
            if table.is_usable() {
                tables.push(table);
            }
        }
        Ok(Table::concat(tables))
    }

    /// Runs the next epoch for every loaded query. The checkpoint is only
    /// written when at least one query produced posts; otherwise the same epoch
    /// number is picked again next time.
    pub async fn run_one_epoch(&self, posts_per_query: i64) -> Result<EpochOutcome> {
        let epochs_dir = self.layout.epochs_dir();
        let epoch = resolve_next_epoch(&epochs_dir)?;
        let start_id = epoch_start(epoch);
        let start_time = Local::now();

        info_time!("Running epoch {}...", epoch);

        let mut tables = Vec::with_capacity(self.queries.len());
        for query in &self.queries {
            let table = self
                .fetch(query, posts_per_query, Some(start_id), None)
                .await?;
            if table.is_usable() {
                tables.push(table);
            }
        }

        if tables.is_empty() {
            warn!(epoch, start_id = %start_id, "every query came back empty, no checkpoint written");
            return Ok(EpochOutcome {
                epoch,
                start_id,
                rows: 0,
                checkpoint: None,
            });
        }

        let table = Table::concat(tables);
        let path = checkpoint_path(&epochs_dir, epoch);
        save_csv(&table, &path)?;
        info_time!(start_time, "Finished epoch {}", epoch);

        Ok(EpochOutcome {
            epoch,
            start_id,
            rows: table.len(),
            checkpoint: Some(path),
        })
    }

    /// Runs `count` epochs back to back. Each one resumes from whatever is on disk.
    pub async fn run_epochs(&self, count: usize, posts_per_query: i64) -> Result<Vec<EpochOutcome>> {
        let start_time = Local::now();
        let mut outcomes = Vec::with_capacity(count);
        for _ in 0..count {
            outcomes.push(self.run_one_epoch(posts_per_query).await?);
        }
        info_time!(start_time, "Finished {} epochs", count);
        Ok(outcomes)
    }

    /// Merges the checkpoints in [`Layout::epochs_dir`] into `combined_epochs.csv`.
    pub fn combine_epochs(&self, id_field: &str) -> Result<Table> {
        combine_checkpoints(self.layout.epochs_dir(), id_field)
    }

    /// Searches one query and writes it twice: as JSON with normalised
    /// timestamps under `<base>/json`, and as CSV under `<base>/csv`.
    pub async fn export_query(
        &self,
        query: &str,
        posts_per_query: i64,
        start_id: Option<u128>,
        end_id: Option<u128>,
    ) -> Result<Table> {
        let params = SearchParams::from_inclusive(posts_per_query, start_id, end_id);
        let posts = self.api.search(query, params).await?;
        let stem = query_file_stem(query);

        let json_dir = self.layout.json_dir();
        std::fs::create_dir_all(&json_dir)?;
        let json_path = json_dir.join(format!("{stem}.json"));
        let exported: Vec<_> = posts.iter().map(|post| post.to_export_json()).collect();
        std::fs::write(&json_path, serde_json::to_vec_pretty(&exported)?)?;
        info_time!("JSON saved to path {} with {} entries", json_path.display(), posts.len());

        let table = Table::from_posts(&posts);
        save_csv(&table, &self.layout.csv_dir().join(format!("{stem}.csv")))?;
        Ok(table)
    }
}

/// Reads every checkpoint in `dir`, keeps the first row per `id_field`, sorts
/// ascending by it and writes the result to `<dir>/combined_epochs.csv`.
///
/// Files are read in epoch order, so when two checkpoints hold the same id the
/// row from the lower epoch wins.
pub fn combine_checkpoints(dir: impl AsRef<Path>, id_field: &str) -> Result<Table> {
    let dir = dir.as_ref();
    let files = csv_files(dir)?;
    info_time!("csv_files: {:?}", files);

    if files.is_empty() {
        return Err(Error::NoCheckpointFiles(dir.to_path_buf()));
    }

    let mut tables = Vec::with_capacity(files.len());
    for file in &files {
        let table = Table::read_csv(file)?;
        if table.is_usable() {
            tables.push(table);
        }
    }

    if tables.is_empty() {
        return Err(Error::NoUsableData(dir.to_path_buf()));
    }

    let combined = Table::concat(tables)
        .drop_duplicates(id_field)?
        .sort_by_column(id_field)?;

    save_csv(&combined, &dir.join(format!("{COMBINED_STEM}.csv")))?;
    Ok(combined)
}

fn save_csv(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    table.write_csv(path)?;
    info_time!("Table saved to path {} with {} entries", path.display(), table.len());
    Ok(())
}
