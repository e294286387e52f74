use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use boxworld_core::{
    GenError,
    level::{Level, LevelConfig},
};
use clap::Parser;
use log::info;
use rayon::prelude::*;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of maps in the train set
    #[arg(long, default_value_t = 10_000)]
    num_train: usize,
    /// Number of maps in the test set
    #[arg(long, default_value_t = 1_000)]
    num_test: usize,
    /// Width/height of the square map
    #[arg(long, default_value_t = 10)]
    map_size: usize,
    /// Length of the goal path
    #[arg(long, default_value_t = 3)]
    goal_length: usize,
    /// Number of distractor paths
    #[arg(long, default_value_t = 2)]
    num_distractor: usize,
    /// Length of each distractor path
    #[arg(long, default_value_t = 2)]
    distractor_length: usize,
    /// Directory the train/test files are written to, created if absent
    #[arg(long, value_name = "DIR")]
    export_path: PathBuf,
}

/// Generates one record per seed in `0..count`, in seed order.
///
/// Every seed is an independent pure task, so the batch fans out over the
/// rayon pool and is collected back into a seed-ordered vector; a failing
/// seed fails the whole batch rather than substituting a different level.
fn generate_records(config: &LevelConfig, count: u64) -> Result<Vec<String>, GenError> {
    (0..count)
        .into_par_iter()
        .map(|seed| Level::generate(config, seed).map(|level| level.to_record()))
        .collect()
}

/// Writes one record per line to `path`.
fn write_split(path: &Path, records: &[String]) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    for record in records {
        writeln!(file, "{record}")?;
    }
    file.flush()
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = LevelConfig {
        map_size: args.map_size,
        goal_length: args.goal_length,
        num_distractor: args.num_distractor,
        distractor_length: args.distractor_length,
    };
    let total = args.num_train + args.num_test;

    info!(
        "generating {total} levels ({} train / {} test) with {config:?}",
        args.num_train, args.num_test
    );
    let records =
        generate_records(&config, total as u64).context("level generation failed")?;

    fs::create_dir_all(&args.export_path).with_context(|| {
        format!("failed to create export directory {}", args.export_path.display())
    })?;
    let train_path = args.export_path.join("train.txt");
    let test_path = args.export_path.join("test.txt");
    write_split(&train_path, &records[..args.num_train])
        .with_context(|| format!("failed to write {}", train_path.display()))?;
    write_split(&test_path, &records[args.num_train..])
        .with_context(|| format!("failed to write {}", test_path.display()))?;

    info!(
        "wrote {} train and {} test records under {}",
        args.num_train,
        args.num_test,
        args.export_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_collected_in_seed_order() {
        let config = LevelConfig::default();
        let records = generate_records(&config, 5).unwrap();
        assert_eq!(records.len(), 5);
        for (seed, record) in records.iter().enumerate() {
            let expected = Level::generate(&config, seed as u64).unwrap().to_record();
            assert_eq!(*record, expected, "seed {seed}");
        }
    }

    #[test]
    fn a_bad_configuration_fails_the_whole_batch() {
        let config = LevelConfig {
            goal_length: 1,
            ..LevelConfig::default()
        };
        assert_eq!(
            generate_records(&config, 3).unwrap_err(),
            GenError::GoalTooShort(1)
        );
    }

    #[test]
    fn split_files_hold_train_then_test_seeds() {
        let config = LevelConfig::default();
        let (num_train, num_test) = (3, 2);
        let records = generate_records(&config, num_train + num_test).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let train_path = dir.path().join("train.txt");
        let test_path = dir.path().join("test.txt");
        write_split(&train_path, &records[..num_train as usize]).unwrap();
        write_split(&test_path, &records[num_train as usize..]).unwrap();

        let train = fs::read_to_string(&train_path).unwrap();
        let test = fs::read_to_string(&test_path).unwrap();
        let train_lines: Vec<&str> = train.lines().collect();
        let test_lines: Vec<&str> = test.lines().collect();
        assert_eq!(train_lines.len(), 3);
        assert_eq!(test_lines.len(), 2);
        for (seed, line) in train_lines.iter().chain(&test_lines).enumerate() {
            let expected = Level::generate(&config, seed as u64).unwrap().to_record();
            assert_eq!(*line, expected, "seed {seed}");
        }
    }
}
