mod args;

use clap::Parser;
use log::{LevelFilter, info, warn};
use std::fs as std_fs;
use std::path::PathBuf;

use args::{Cli, Collisions, Commands};
use indicatif::{ProgressBar, ProgressStyle};

use innodec_core::{
    CollisionAction, ExtractOptions, LoadOptions, ProgressEvent, Result, extract_with_progress,
    list, load_info,
};

fn main() {
    let cli = Cli::parse();
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        builder.filter(None, LevelFilter::Info);
    }
    if cli.verbose {
        builder.filter(None, LevelFilter::Debug);
    }
    builder.init();

    if let Err(e) = run(&cli) {
        eprintln!("\x1b[31mError:\x1b[0m {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Extract {
            input,
            output,
            password,
            collisions,
            temp,
            language,
            include,
            timestamps,
            local_timestamps,
            lowercase,
            codepage,
            accept_unknown,
            slice_dir,
            manifest,
        } => {
            let out_dir = output.clone().unwrap_or_else(|| {
                input
                    .file_stem()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("extracted"))
            });
            std_fs::create_dir_all(&out_dir)?;

            let options = ExtractOptions {
                output_dir: out_dir.clone(),
                password: password.clone(),
                collisions: match collisions {
                    Collisions::Overwrite => CollisionAction::Overwrite,
                    Collisions::Rename => CollisionAction::Rename,
                    Collisions::RenameAll => CollisionAction::RenameAll,
                    Collisions::Error => CollisionAction::Error,
                },
                extract_temp: *temp,
                language_filter: language.clone(),
                include_patterns: include.clone(),
                preserve_timestamps: *timestamps,
                local_timestamps: *local_timestamps,
                lowercase_paths: *lowercase,
                codepage_override: *codepage,
                accept_unknown_version: *accept_unknown,
                slice_dir: slice_dir.clone(),
                cancel: None,
            };

            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                )
                .unwrap()
                .progress_chars("#>-"),
            );
            let on_progress = move |event: ProgressEvent| match event {
                ProgressEvent::Start(total) => {
                    pb.set_length(total);
                    pb.enable_steady_tick(std::time::Duration::from_millis(100));
                }
                ProgressEvent::Inc(n) => pb.inc(n),
                ProgressEvent::Finish => pb.finish_and_clear(),
            };

            let report = extract_with_progress(input, &options, on_progress)?;
            info!(
                "extracted {} files ({} bytes), {} warnings",
                report.files_extracted, report.bytes_extracted, report.warnings
            );
            for path in &report.failed_checksums {
                warn!("checksum mismatch: {path}");
            }

            if *manifest {
                let listing = list(input, &options)?;
                let toml_str = toml::to_string_pretty(&listing)
                    .map_err(|e| std::io::Error::other(e.to_string()))?;
                let manifest_path = out_dir.with_extension("toml");
                std_fs::write(&manifest_path, toml_str)?;
                info!("manifest saved to {}", manifest_path.display());
            }
            Ok(())
        }
        Commands::List {
            input,
            accept_unknown,
        } => {
            let options = ExtractOptions {
                accept_unknown_version: *accept_unknown,
                ..ExtractOptions::default()
            };
            let listing = list(input, &options)?;

            println!();
            println!("{:<15} | {:<6} | Path", "Size (Bytes)", "Parts");
            println!("{:-<15}-|-{:-<6}-|--------------------------------", "", "");
            for entry in &listing.entries {
                println!("{:<15} | {:<6} | {}", entry.size, entry.parts, entry.path);
            }
            println!("\nTotal files: {}", listing.entries.len());
            Ok(())
        }
        Commands::Info {
            input,
            accept_unknown,
        } => {
            let options = LoadOptions {
                accept_unknown_version: *accept_unknown,
                codepage_override: None,
            };
            let (offsets, setup) = load_info(input, &options)?;

            println!("Data version:  {}", setup.version);
            println!("App name:      {}", setup.header.app_name);
            println!("App version:   {}", setup.header.app_version);
            println!("Publisher:     {}", setup.header.app_publisher);
            println!("Compression:   {:?}", setup.header.compression);
            println!("Header offset: {:#x}", offsets.header_offset);
            if offsets.data_offset != 0 {
                println!("Data offset:   {:#x}", offsets.data_offset);
            } else {
                println!(
                    "Data:          external, {} slice(s) per disk",
                    setup.header.slices_per_disk
                );
            }
            println!("Languages:     {}", setup.languages.len());
            println!("Files:         {}", setup.files.len());
            println!("Locations:     {}", setup.file_locations.len());
            Ok(())
        }
    }
}
