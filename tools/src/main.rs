//! save-runner: headless driver for the single-slot save store.
//!
//! Usage:
//!   save-runner save  [--async] [--seed 12345] [--data-dir ./data | --config store.json]
//!   save-runner load  [--data-dir ./data]
//!   save-runner status
//!   save-runner clear [--delete-file]

use anyhow::{bail, Result};
use savegame_core::{
    rng::sample_snapshot, SaveCoordinator, SaveMode, SharedFeedback, StoreConfig,
};
use std::env;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("status");
    let config = load_config(&args)?;

    let feedback = SharedFeedback::new();
    let coordinator = SaveCoordinator::from_config(&config, Arc::new(feedback.clone()))?;

    println!("save-runner");
    println!("  command:   {command}");
    println!("  save file: {}", coordinator.path().display());
    println!();

    match command {
        "save" => {
            let seed = parse_arg(&args, "--seed", 42u64);
            let mode = if has_flag(&args, "--async") { SaveMode::Async } else { SaveMode::Sync };
            run_save(&coordinator, &feedback, seed, mode).await?;
        }
        "load" => {
            if !coordinator.load() {
                bail!("no loadable save at {}", coordinator.path().display());
            }
            if let Some(snapshot) = coordinator.loaded() {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            if !coordinator.has_loaded_data() {
                println!("(save file holds an invalid snapshot)");
            }
        }
        "status" => {
            let loadable = coordinator.load() && coordinator.has_loaded_data();
            println!("  allow save/load: {}", coordinator.allow_save_load());
            println!("  loadable save:   {loadable}");
            if let Some(snapshot) = coordinator.loaded() {
                println!("  score:           {}", snapshot.score);
                println!("  area:            {}", snapshot.current_area_index);
                println!("  defeated:        {}", snapshot.defeated_count());
                println!("  complete:        {}", snapshot.complete);
            }
        }
        "clear" => {
            let delete_file = has_flag(&args, "--delete-file");
            if !coordinator.clear_all(delete_file) {
                bail!("could not clear {}", coordinator.path().display());
            }
            println!("  cleared (file deleted: {delete_file})");
        }
        other => bail!("unknown command '{other}' (expected save, load, status or clear)"),
    }

    Ok(())
}

async fn run_save(
    coordinator: &SaveCoordinator,
    feedback: &SharedFeedback,
    seed: u64,
    mode: SaveMode,
) -> Result<()> {
    let snapshot = sample_snapshot(seed);
    println!(
        "  saving seed {seed}: score={} area={} mode={mode:?}",
        snapshot.score, snapshot.current_area_index
    );

    if !coordinator.save(snapshot, mode) {
        bail!("save rejected");
    }

    if mode == SaveMode::Async {
        // Poll the indicator the way a UI would, once per frame.
        let mut frames = 0u32;
        while coordinator.is_save_in_progress() {
            if frames % 30 == 0 {
                println!("  [{}]", feedback.text());
            }
            frames += 1;
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
        if coordinator.wait_for_save().await != Some(true) {
            bail!("async save failed");
        }
    }

    println!("  saved.");
    Ok(())
}

fn load_config(args: &[String]) -> Result<StoreConfig> {
    if let Some(path) = arg_value(args, "--config") {
        return StoreConfig::load(path);
    }
    Ok(match arg_value(args, "--data-dir") {
        Some(dir) => StoreConfig::in_dir(dir),
        None => StoreConfig::default(),
    })
}

fn arg_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn parse_arg<T: std::str::FromStr>(args: &[String], name: &str, default: T) -> T {
    arg_value(args, name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
