mod cache;
mod config;
mod emitter;
mod error;
mod freshness;
mod parser;
mod resolver;

use clap::Parser;
use std::fs;
use std::path::PathBuf;

use crate::emitter::StubOptions;
use crate::error::{QtuiError, QtuiResult};
use crate::resolver::TypeResolver;

#[derive(Parser)]
#[command(
    name = "qtui2pyi",
    version,
    about = "Creates Python pyi stub files from Qt Designer ui files \
             to add type annotations for IDEs and linters"
)]
struct Cli {
    /// Input Qt Designer ui file (e.g., Main.ui)
    input: PathBuf,
    /// Qt package name (PySide6, PyQt6, ...)
    #[arg(short, long)]
    package: Option<String>,
    /// Output pyi file path. Omit to stream to STDOUT
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Use star imports instead of selective ones
    #[arg(short, long)]
    star_imports: bool,
    /// Force recreation of the output file even if it seems up to date
    #[arg(short, long)]
    force: bool,
    /// Rebuild the Qt class cache for the current toolkit version
    #[arg(long)]
    refresh_cache: bool,
    /// Print progress details
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> QtuiResult<()> {
    // 設定ファイル（任意）の読み込み。CLI フラグが常に優先
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = config::find_and_load(&cwd)?;

    let package = cli
        .package
        .clone()
        .unwrap_or_else(|| config.defaults.package.clone());
    let star_imports = cli.star_imports || config.defaults.star_imports;
    let python = std::env::var("QTUI2PYI_PYTHON")
        .unwrap_or_else(|_| config.defaults.python.clone());

    if !cli.input.is_file() {
        return Err(QtuiError::Io(
            cli.input.clone(),
            std::io::Error::new(std::io::ErrorKind::NotFound, "source ui file not found"),
        ));
    }

    if cli.verbose {
        eprintln!(
            "  - {}",
            if star_imports { "Star imports" } else { "Selective imports" }
        );
        eprintln!(
            "  - {}",
            if cli.force { "Forcing recreation" } else { "Only recreate if outdated" }
        );
        eprintln!("  - Creating pyi file for {}", package);
        match &cli.output {
            Some(out) => eprintln!("  - Writing to {}", out.display()),
            None => eprintln!("  - Writing to STDOUT"),
        }
    }

    // --- 1. Freshness (再生成が必要か) ---
    // ファイル出力時のみ。STDOUT へは常に出力する
    if let Some(out_path) = &cli.output {
        if !cli.force && !freshness::needs_regenerate(&cli.input, out_path)? {
            eprintln!("✅ Output file is already up to date. Use -f to force recreation.");
            return Ok(());
        }
    }

    // --- 2. Parsing (ui ファイル解析) ---
    let source =
        fs::read_to_string(&cli.input).map_err(|e| QtuiError::Io(cli.input.clone(), e))?;
    let doc = parser::parse_ui(&source)?;
    if cli.verbose {
        eprintln!("  ✨ Top widget: {}({})", doc.top.name, doc.top.class_name);
        if let Some(title) = doc.top.properties.get("windowTitle") {
            eprintln!("  ✨ Window title: '{}'", title);
        }
    }

    // --- 3. Resolution (クラスキャッシュの用意) ---
    // スターモードはクラス解決を行わないので、ツールキット未インストールでも動く
    let resolver = if star_imports {
        TypeResolver::from_cache(&package, "unknown", Default::default())
    } else {
        TypeResolver::new(&package, &python, cli.refresh_cache)?
    };
    if cli.verbose && !star_imports {
        eprintln!("  ⚙️  Qt version: {}", resolver.version());
    }

    // --- 4. Emission (スタブ生成) ---
    let opts = StubOptions {
        source_path: &cli.input,
        source_mtime_secs: freshness::mtime_secs(&cli.input)?,
        output_file: cli.output.as_deref(),
        star_imports,
    };
    match &cli.output {
        Some(out_path) => {
            let stub = emitter::render_stub(&doc, &resolver, &opts)?;
            fs::write(out_path, stub).map_err(|e| QtuiError::Io(out_path.clone(), e))?;
            eprintln!("🎉 Created '{}'", out_path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            emitter::emit_stub(&doc, &resolver, &opts, &mut lock)?;
        }
    }
    Ok(())
}
