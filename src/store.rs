use std::path::{Path, PathBuf};

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StatisticError;

/// File name of the calculate-count statistic inside a run directory.
pub const STATISTIC_FILE_NAME: &str = "calculate_count_per_second.csv";

// ─── File store ──────────────────────────────────────────────────

/// `<root>/<run_id>/calculate_count_per_second.csv`
#[derive(Debug, Clone)]
pub struct CsvFileStore {
    root: PathBuf,
}

impl CsvFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, run_id: Uuid) -> PathBuf {
        self.root.join(run_id.to_string()).join(STATISTIC_FILE_NAME)
    }

    /// Writes one record per line, `\n`-terminated.
    pub async fn write(&self, run_id: Uuid, lines: &[String]) -> Result<PathBuf, StatisticError> {
        let path = self.path_for(run_id);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let mut body = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines {
            body.push_str(line);
            body.push('\n');
        }
        tokio::fs::write(&path, body).await?;

        info!(%run_id, path = %path.display(), records = lines.len(), "statistic written");
        Ok(path)
    }

    pub async fn read(&self, run_id: Uuid) -> Result<Vec<String>, StatisticError> {
        let path = self.path_for(run_id);
        let body = match tokio::fs::read_to_string(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StatisticError::NotFound(format!("no statistic file for run {run_id}")));
            }
            Err(e) => return Err(e.into()),
        };

        debug!(%run_id, path = %path.display(), "statistic read");
        Ok(body.lines().map(str::to_owned).collect())
    }

    /// Run ids that have a statistic file, sorted.
    pub async fn list_runs(&self) -> Result<Vec<Uuid>, StatisticError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut runs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(run_id) = entry.file_name().to_str().and_then(|n| Uuid::parse_str(n).ok()) else {
                continue;
            };
            if tokio::fs::try_exists(self.path_for(run_id)).await? {
                runs.push(run_id);
            }
        }
        runs.sort();
        Ok(runs)
    }
}

// ─── Redis store ─────────────────────────────────────────────────

/// One Redis list per run, one record per element.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// `ConnectionManager` reconnects on its own and is cheap to clone.
    pub async fn connect(url: &str) -> Result<Self, StatisticError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    pub fn key_for(run_id: Uuid) -> String {
        format!("statistic:{run_id}:calculate_count_per_second")
    }

    /// Replaces whatever was stored for `run_id`.
    pub async fn write(&self, run_id: Uuid, lines: &[String]) -> Result<(), StatisticError> {
        let key = Self::key_for(run_id);
        let mut conn = self.conn.clone();

        let mut pipe = redis::pipe();
        pipe.atomic().del(&key).ignore();
        if !lines.is_empty() {
            pipe.rpush(&key, lines).ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;

        info!(%run_id, key = %key, records = lines.len(), "statistic stored in redis");
        Ok(())
    }

    pub async fn read(&self, run_id: Uuid) -> Result<Vec<String>, StatisticError> {
        let key = Self::key_for(run_id);
        let mut conn = self.conn.clone();

        let lines: Vec<String> = conn.lrange(&key, 0, -1).await?;
        if lines.is_empty() {
            return Err(StatisticError::NotFound(format!("no statistic in redis for run {run_id}")));
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::sample::HEADER;
    use crate::metrics::{Sample, ThroughputCollector};
    use tempfile::TempDir;

    fn lines() -> Vec<String> {
        vec![HEADER.to_owned(), "1000,100".to_owned(), "2500,133".to_owned()]
    }

    #[tokio::test]
    async fn write_then_read_file() {
        let temp = TempDir::new().unwrap();
        let store = CsvFileStore::new(temp.path());
        let run_id = Uuid::new_v4();

        let path = store.write(run_id, &lines()).await.unwrap();
        assert!(path.ends_with(STATISTIC_FILE_NAME));

        let on_disk = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(on_disk, "elapsedMillis,ratePerSecond\n1000,100\n2500,133\n");

        let read = store.read(run_id).await.unwrap();
        assert_eq!(read, lines());

        let mut collector = ThroughputCollector::default();
        collector.load_from(&read).unwrap();
        assert_eq!(
            collector.samples(),
            vec![Sample::new(1000, 100), Sample::new(2500, 133)]
        );
    }

    #[tokio::test]
    async fn crlf_files_still_load() {
        let temp = TempDir::new().unwrap();
        let store = CsvFileStore::new(temp.path());
        let run_id = Uuid::new_v4();
        let path = store.path_for(run_id);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "elapsedMillis,ratePerSecond\r\n1000,5\r\n").await.unwrap();

        let mut collector = ThroughputCollector::default();
        collector.load_from(store.read(run_id).await.unwrap()).unwrap();
        assert_eq!(collector.samples(), vec![Sample::new(1000, 5)]);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = CsvFileStore::new(temp.path());
        assert!(matches!(
            store.read(Uuid::new_v4()).await,
            Err(StatisticError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn lists_only_run_directories_with_a_statistic() {
        let temp = TempDir::new().unwrap();
        let store = CsvFileStore::new(temp.path().join("results"));
        assert!(store.list_runs().await.unwrap().is_empty());

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.write(a, &lines()).await.unwrap();
        store.write(b, &lines()).await.unwrap();
        tokio::fs::create_dir_all(store.root().join(Uuid::new_v4().to_string()))
            .await
            .unwrap();
        tokio::fs::create_dir_all(store.root().join("not-a-run")).await.unwrap();

        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(store.list_runs().await.unwrap(), expected);
    }

    #[test]
    fn redis_keys_are_per_run() {
        let id = Uuid::nil();
        assert_eq!(
            RedisStore::key_for(id),
            "statistic:00000000-0000-0000-0000-000000000000:calculate_count_per_second"
        );
    }
}
