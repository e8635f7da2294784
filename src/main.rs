use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Result;
use clap::Parser;
use log::warn;
use rayon::prelude::*;
use walkdir::WalkDir;

use camrename::{format, relocate, Config, Outcome, RelocateError, Resolver};

mod util;

use util::die;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Expand directories into the files inside them. Anything else is passed through as-is, so a
/// path that doesn't exist still gets reported as unhandled later on.
fn collect_files(args: &[PathBuf], recursive: bool) -> (Vec<PathBuf>, usize) {
    let mut files = Vec::new();
    let mut walk_errors = 0;

    for arg in args {
        if !arg.is_dir() {
            files.push(arg.clone());
            continue;
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        for entry in WalkDir::new(arg)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
        {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(err) => {
                    eprintln!("failed to walk {}: {}", arg.display(), err);
                    walk_errors += 1;
                }
            }
        }
    }

    (files, walk_errors)
}

/// Plan everything first so two inputs that resolve to the same name can't race each other: the
/// first one in input order wins, the rest are skipped before anything is copied.
fn process_files(cfg: &Config, files: &[PathBuf]) -> Vec<Outcome> {
    let resolver = Resolver::with_media_metadata();
    let planned: Vec<_> = files
        .par_iter()
        .map(|file| format::plan(&resolver, file, cfg.dest.as_deref(), &cfg.fmt))
        .collect();

    let mut seen = HashSet::new();
    let mut todo = Vec::new();
    let mut outcomes = Vec::with_capacity(files.len());

    for (idx, (file, planned)) in files.iter().zip(planned).enumerate() {
        match planned {
            Ok(plan) if seen.insert(plan.destination.clone()) => todo.push((idx, plan)),
            Ok(plan) => {
                let reason = RelocateError::DestinationCollision(plan.destination);
                outcomes.push((idx, relocate::skipped(file, reason)));
            }
            Err(reason) => outcomes.push((idx, relocate::unhandled(file, reason))),
        }
    }

    outcomes.par_extend(
        todo.into_par_iter()
            .map(|(idx, plan)| (idx, relocate::execute(plan, cfg.dry_run))),
    );
    outcomes.sort_by_key(|(idx, _)| *idx);
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}

fn report(outcomes: &[Outcome]) -> usize {
    let mut unhandled = 0;
    for outcome in outcomes {
        match (outcome, outcome.unhandled()) {
            (Outcome::Relocated(plan), _) => {
                println!("{} -> {}", plan.source.display(), plan.destination.display())
            }
            (_, Some(path)) => {
                unhandled += 1;
                match outcome.reason() {
                    Some(reason) => eprintln!("unhandled: {}: {}", path.display(), reason),
                    None => eprintln!("unhandled: {}", path.display()),
                }
            }
            (_, None) => {}
        }
    }
    unhandled
}

fn check_dest(dest: &Path) {
    if dest.exists() && !dest.is_dir() {
        die!("{} exists and is not a directory", dest.display());
    }
}

fn main() -> Result<()> {
    let cfg = Config::parse();
    init_logging(cfg.verbose);

    if let Some(jobs) = cfg.jobs {
        if let Err(err) = rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global() {
            warn!("cannot use {} worker threads: {}", jobs, err);
        }
    }
    if let Some(dest) = &cfg.dest {
        check_dest(dest);
    }

    let (files, walk_errors) = collect_files(&cfg.files, cfg.recursive);
    let outcomes = process_files(&cfg, &files);
    let unhandled = report(&outcomes);

    if unhandled + walk_errors > 0 {
        process::exit(1);
    }
    Ok(())
}
