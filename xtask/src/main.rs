use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for retro-canvas")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks (fmt, clippy, build, tests, doc tests, bench build)
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Quick checks before commit (fmt, clippy)
    Check {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Build the project
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        #[arg(long)]
        doc: bool,
        #[arg(long)]
        ignored: bool,
        /// Run only pipeline module tests
        #[arg(long)]
        pipeline: bool,
        /// Run only display module tests (conversion, palette, canvas)
        #[arg(long)]
        display: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
    /// Run criterion benchmarks
    Bench {
        /// Only this bench target (convert or render)
        target: Option<String>,
        /// Compile the benches without running them
        #[arg(long)]
        no_run: bool,
    },
    /// Run the demo host
    Demo {
        /// Path to a pipeline config file
        config: Option<String>,
        /// Build in release mode
        #[arg(long)]
        release: bool,
    },
    /// Pre-commit hook (fmt, clippy, unit tests)
    PreCommit,
    /// Install git hooks
    InstallHooks,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { verbose } => run_ci(verbose),
        Commands::Check { verbose } => run_check(verbose),
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy { fix } => run_clippy(fix),
        Commands::Build { release } => run_build(release),
        Commands::Test {
            doc,
            ignored,
            pipeline,
            display,
            integration,
        } => run_test(doc, ignored, pipeline, display, integration),
        Commands::Bench { target, no_run } => run_bench(target.as_deref(), no_run),
        Commands::Demo { config, release } => run_demo(config.as_deref(), release),
        Commands::PreCommit => run_pre_commit(),
        Commands::InstallHooks => install_hooks(),
    }
}

fn run_ci(verbose: bool) -> Result<()> {
    println!("{}", "=== retro-canvas CI ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;
    run_task("Build", || run_build(false), verbose)?;
    run_task(
        "Unit + Integration Tests",
        || run_test(false, false, false, false, false),
        verbose,
    )?;
    run_task(
        "Doc Tests",
        || run_test(true, false, false, false, false),
        verbose,
    )?;
    // Benches use the public API only; keep them compiling
    run_task("Bench Build", || run_bench(None, true), verbose)?;

    let elapsed = start.elapsed();
    println!(
        "\n{} {}",
        "✓ CI passed in".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn run_check(verbose: bool) -> Result<()> {
    println!("{}", "=== Running Quick Checks ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;

    let elapsed = start.elapsed();
    println!(
        "\n{} {}",
        "✓ Checks passed in".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("fmt").arg("--all");

    if check {
        cmd.arg("--").arg("--check");
    }

    execute_command(&mut cmd)
}

fn run_clippy(fix: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("clippy").arg("--all-targets").arg("--workspace");

    if fix {
        cmd.arg("--fix");
    } else {
        cmd.arg("--").arg("-D").arg("warnings");
    }

    execute_command(&mut cmd)
}

fn run_build(release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("build");

    if release {
        cmd.arg("--release");
    }

    execute_command(&mut cmd)
}

fn run_test(
    doc: bool,
    ignored: bool,
    pipeline: bool,
    display: bool,
    integration: bool,
) -> Result<()> {
    if doc {
        let mut cmd = Command::new("cargo");
        cmd.arg("test").arg("--doc");

        if ignored {
            cmd.arg("--").arg("--ignored");
        }

        return execute_command(&mut cmd);
    }

    // Determine which test groups to run
    let group_flags = [pipeline, display, integration];
    let group_count = group_flags.iter().filter(|&&f| f).count();

    if group_count == 0 {
        // Run all tests
        let mut cmd = Command::new("cargo");
        cmd.arg("test");

        if ignored {
            cmd.arg("--").arg("--ignored");
        }

        return execute_command(&mut cmd);
    }

    let groups: [(bool, &[&str], &str); 3] = [
        (pipeline, &["--lib", "pipeline"], "Pipeline"),
        (display, &["--lib", "display"], "Display"),
        (
            integration,
            &["--test", "functionality_test", "--test", "concurrency_tests"],
            "Integration",
        ),
    ];

    let mut all_success = true;

    for (enabled, args, group_name) in groups {
        if !enabled {
            continue;
        }

        println!("{} Running {} tests...", "→".blue(), group_name.bold());

        let mut cmd = Command::new("cargo");
        cmd.arg("test").args(args);

        if ignored {
            cmd.arg("--").arg("--ignored");
        }

        match execute_command(&mut cmd) {
            Ok(_) => {
                println!("{} {} tests passed\n", "✓".green(), group_name);
            }
            Err(e) => {
                println!("{} {} tests failed\n", "✗".red(), group_name);
                all_success = false;
                if group_count == 1 {
                    // If only one group was requested, return the error immediately
                    return Err(e);
                }
            }
        }
    }

    if all_success {
        Ok(())
    } else {
        anyhow::bail!("Some test groups failed")
    }
}

fn run_bench(target: Option<&str>, no_run: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("bench");

    match target {
        Some("convert") => {
            cmd.arg("--bench").arg("convert_bench");
        }
        Some("render") => {
            cmd.arg("--bench").arg("render_bench");
        }
        Some(other) => anyhow::bail!("Unknown bench '{}' (expected convert or render)", other),
        None => {}
    }

    if no_run {
        cmd.arg("--no-run");
    }

    execute_command(&mut cmd)
}

fn run_demo(config: Option<&str>, release: bool) -> Result<()> {
    use std::path::Path;

    println!("{}", "=== Demo ===".bold().blue());

    if let Some(path) = config {
        if !Path::new(path).exists() {
            println!(
                "{} Config file not found, defaults will be written to: {}",
                "⚠".yellow().bold(),
                path.yellow()
            );
        } else {
            println!("{} Config file: {}", "✓".green(), path.cyan());
        }
    }
    println!(
        "{} Build mode: {}",
        "→".blue(),
        if release {
            "release".green().bold()
        } else {
            "debug".yellow().bold()
        }
    );
    println!();

    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.arg("run").arg("--bin").arg("retro-canvas");

    if release {
        cmd.arg("--release");
    }

    if let Some(path) = config {
        cmd.arg("--").arg(path);
    }

    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        println!("\n{} Demo failed", "✗".red().bold());
        anyhow::bail!("Demo failed with exit code: {}", status);
    }

    let elapsed = start.elapsed();
    println!(
        "\n{} Demo completed in {}",
        "✓".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn run_pre_commit() -> Result<()> {
    println!("{}", "=== Pre-commit Checks ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), false)?;
    run_task("Clippy", || run_clippy(false), false)?;
    // Unit tests only; the threaded integration suites run in `cargo x ci`
    run_task(
        "Pipeline + Display Tests",
        || run_test(false, false, true, true, false),
        false,
    )?;

    let elapsed = start.elapsed();
    println!(
        "\n{} {}",
        "✓ Pre-commit checks passed in".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn install_hooks() -> Result<()> {
    use std::fs;

    println!("{}", "Installing git hooks...".bold());

    let hooks_dir = std::path::Path::new(".git/hooks");
    if !hooks_dir.is_dir() {
        anyhow::bail!("No .git/hooks directory; run from the repository root");
    }

    let hook_content = r#"#!/bin/sh
# Installed by `cargo x install-hooks` (retro-canvas)
set -e

cargo x pre-commit
"#;

    let hook_path = hooks_dir.join("pre-commit");
    fs::write(&hook_path, hook_content)?;

    // Make executable (Unix only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(&hook_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&hook_path, perms)?;
    }

    println!("{}", "✓ Git hooks installed".green());
    println!("  Pre-commit hook will run: fmt, clippy, pipeline and display unit tests");

    Ok(())
}

fn run_task<F>(name: &str, task: F, verbose: bool) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    print!("{} {} ... ", "→".blue(), name);

    let start = Instant::now();

    match task() {
        Ok(_) => {
            let elapsed = start.elapsed();
            println!(
                "{} {}",
                "✓".green().bold(),
                if verbose {
                    format!("({:.2}s)", elapsed.as_secs_f64())
                } else {
                    String::new()
                }
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", "✗".red().bold());
            Err(e)
        }
    }
}

fn execute_command(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("Command failed with exit code: {}", status);
    }

    Ok(())
}
