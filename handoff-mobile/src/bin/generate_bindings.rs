//! Generates Swift, Kotlin or Python sources for handoff-mobile from a built library.

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use uniffi_bindgen::bindings::{
    KotlinBindingGenerator, PythonBindingGenerator, SwiftBindingGenerator,
};
use uniffi_bindgen::{library_mode, BindingGenerator, EmptyCrateConfigSupplier};

#[derive(Parser)]
#[command(name = "generate-bindings", version)]
#[command(about = "Generate foreign-language bindings for handoff-mobile")]
struct Args {
    /// Built handoff-mobile library; defaults to the release artifact for this host
    #[arg(long)]
    library: Option<Utf8PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Target::Swift)]
    language: Target,

    /// Defaults to `<language>/generated`
    #[arg(short, long)]
    out_dir: Option<Utf8PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Target {
    Swift,
    Kotlin,
    Python,
}

impl Target {
    fn dir_name(self) -> &'static str {
        match self {
            Target::Swift => "swift",
            Target::Kotlin => "kotlin",
            Target::Python => "python",
        }
    }
}

fn default_library() -> Utf8PathBuf {
    let ext = if cfg!(target_os = "macos") {
        "dylib"
    } else if cfg!(target_os = "windows") {
        "dll"
    } else {
        "so"
    };
    Utf8PathBuf::from(format!("../target/release/libhandoff_mobile.{ext}"))
}

fn run<G: BindingGenerator>(
    library: &Utf8Path,
    generator: &G,
    out_dir: &Utf8Path,
) -> anyhow::Result<()> {
    library_mode::generate_bindings(
        library,
        None,
        generator,
        &EmptyCrateConfigSupplier,
        None,
        out_dir,
        false,
    )?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let library = args.library.unwrap_or_else(default_library);
    if !library.is_file() {
        anyhow::bail!("no library at {library}; build handoff-mobile in release mode first");
    }

    let out_dir = args
        .out_dir
        .unwrap_or_else(|| Utf8PathBuf::from(args.language.dir_name()).join("generated"));
    std::fs::create_dir_all(&out_dir)?;

    eprintln!("{:?} bindings from {library} -> {out_dir}", args.language);
    match args.language {
        Target::Swift => run(&library, &SwiftBindingGenerator, &out_dir)?,
        Target::Kotlin => run(&library, &KotlinBindingGenerator, &out_dir)?,
        Target::Python => run(&library, &PythonBindingGenerator, &out_dir)?,
    }
    Ok(())
}
