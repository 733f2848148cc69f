use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use morphc::backend::{self, Target, toolchain};
use morphc::cook::{Oracle, OracleConfig, Overlay, SymbolResolver, SymbolTable, cook};
use morphc::graph::Program;
use morphc::interpreter;
use morphc::layout::{Layout, LoadedLayout};

#[derive(Parser)]
#[command(name = "morphc", version)]
#[command(about = "Compile typed dataflow graphs to C++ or Haskell")]
struct Args {
    /// Extra `name :: type` declarations, one per line
    #[arg(long, global = true)]
    symbols: Option<PathBuf>,

    /// Resolve symbols by asking an interactive tool, e.g. "ghci -v0"
    #[arg(long, global = true)]
    oracle: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate a layout to host source code
    Compile {
        layout: PathBuf,
        #[arg(short, long, value_enum, default_value_t = BackendArg::Cpp)]
        backend: BackendArg,
        /// Write the source here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate a layout with the reference evaluator
    Run {
        layout: PathBuf,
        /// Call function NAME with VALUE instead of running main
        #[arg(long, value_name = "NAME=VALUE")]
        arg: Option<String>,
    },
    /// Print the typed graph in DOT format
    Dot { layout: PathBuf },
    /// Translate, build with the host toolchain and run the result
    Exec {
        layout: PathBuf,
        #[arg(short, long, value_enum, default_value_t = BackendArg::Cpp)]
        backend: BackendArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Cpp,
    Haskell,
}

impl From<BackendArg> for Target {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Cpp => Target::Cpp,
            BackendArg::Haskell => Target::Haskell,
        }
    }
}

/// Where symbols not declared in `--symbols` come from.
enum Base {
    Prelude(SymbolTable),
    Oracle(Oracle),
}

impl Base {
    fn from_args(args: &Args) -> Result<Self> {
        let Some(command) = &args.oracle else {
            return Ok(Base::Prelude(SymbolTable::prelude()));
        };
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next().context("empty --oracle command")?;
        let config = OracleConfig {
            program,
            args: words.collect(),
            ..OracleConfig::default()
        };
        let oracle = Oracle::start(config).context("failed to start the symbol oracle")?;
        Ok(Base::Oracle(oracle))
    }

    fn resolver(&self) -> &dyn SymbolResolver {
        match self {
            Base::Prelude(table) => table,
            Base::Oracle(oracle) => oracle,
        }
    }
}

fn extra_symbols(path: Option<&Path>) -> Result<SymbolTable> {
    let mut table = SymbolTable::new();
    if let Some(path) = path {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read symbols from {}", path.display()))?;
        let added = table
            .load(&text)
            .with_context(|| format!("malformed symbol file {}", path.display()))?;
        info!(added, path = %path.display(), "loaded symbols");
    }
    Ok(table)
}

fn load(path: &Path) -> Result<LoadedLayout> {
    Layout::load(path)
        .and_then(|layout| layout.to_raw())
        .with_context(|| format!("failed to load layout {}", path.display()))
}

fn cook_layout(loaded: &LoadedLayout, resolver: &dyn SymbolResolver) -> Result<Program> {
    cook(&loaded.raw, resolver).context("failed to type the program graph")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("morphc=info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let base = Base::from_args(&args)?;
    let resolver = Overlay::with_table(base.resolver(), extra_symbols(args.symbols.as_deref())?);

    match &args.command {
        Command::Compile {
            layout,
            backend,
            output,
        } => {
            let loaded = load(layout)?;
            let program = cook_layout(&loaded, &resolver)?;
            let target = Target::from(*backend);
            let translation = backend::compile(
                &program,
                target.backend().as_ref(),
                &loaded.libraries,
                &loaded.imports,
            )
            .context("failed to translate the program")?;
            match output {
                Some(path) => fs::write(path, &translation.source)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{}", translation.source),
            }
        }
        Command::Run { layout, arg } => {
            let loaded = load(layout)?;
            let program = cook_layout(&loaded, &resolver)?;
            let plan = backend::plan_program(&program).context("failed to plan the program")?;
            let value = match arg {
                Some(arg) => {
                    let (name, text) = arg
                        .split_once('=')
                        .context("--arg takes NAME=VALUE")?;
                    let value = interpreter::parse_value(text.trim())?;
                    interpreter::call(&plan, name.trim(), value)?
                }
                None => interpreter::run_main(&plan)?,
            };
            println!("{value}");
        }
        Command::Dot { layout } => {
            let loaded = load(layout)?;
            let program = cook_layout(&loaded, &resolver)?;
            print!("{}", program.to_dot());
        }
        Command::Exec { layout, backend } => {
            let loaded = load(layout)?;
            let program = cook_layout(&loaded, &resolver)?;
            let target = Target::from(*backend);
            let translation = backend::compile(
                &program,
                target.backend().as_ref(),
                &loaded.libraries,
                &loaded.imports,
            )
            .context("failed to translate the program")?;
            let output = toolchain::run(&translation)
                .with_context(|| format!("failed to build or run the {target} program"))?;
            eprint!("{}", output.stderr);
            print!("{}", output.stdout);
        }
    }
    Ok(())
}
