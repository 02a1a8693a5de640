use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::debug;
use xft_core::{DType, Operand, PromotionConfig, PromotionMode, Scalar, WeakKind, XftError};
use xft_ops::{Node, Promoter, get_dtype_info};

#[derive(Parser, Debug)]
#[command(name = "xft")]
#[command(about = "Query dtype promotion rules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print a handful of representative promotions.
    Smoke,
    /// Result dtype of promoting the given dtypes. `int`, `float` and
    /// `complex` stand for untyped literals.
    Promote {
        #[arg(required = true)]
        dtypes: Vec<String>,

        /// Promotion mode: `standard` or `strict`.
        #[arg(long, default_value = "standard")]
        mode: String,

        /// Disable 64-bit defaults.
        #[arg(long)]
        no_x64: bool,
    },
    /// Whether `from` can be cast to `to` without loss under promotion.
    Cast {
        from: String,
        to: String,

        #[arg(long, default_value = "standard")]
        mode: String,

        #[arg(long)]
        no_x64: bool,
    },
    /// Dtype metadata as JSON.
    Info { dtype: String },
    /// Pairwise promotion table over every lattice dtype.
    Table {
        #[arg(long, default_value = "standard")]
        mode: String,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Xft(#[from] XftError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Smoke => smoke(),
        Cmd::Promote {
            dtypes,
            mode,
            no_x64,
        } => promote(&dtypes, &mode, no_x64),
        Cmd::Cast {
            from,
            to,
            mode,
            no_x64,
        } => cast(&from, &to, &mode, no_x64),
        Cmd::Info { dtype } => info(&dtype),
        Cmd::Table { mode } => table(&mode),
    }
}

fn promoter(mode: &str, no_x64: bool) -> Result<Promoter, CliError> {
    let mode: PromotionMode = mode.parse()?;
    let config = PromotionConfig::new(mode, !no_x64);
    debug!(%mode, x64 = config.x64, "using promotion config");
    Ok(Promoter::new(config))
}

/// Weak node names become representative literals so that they promote as
/// weakly typed operands.
fn operand(name: &str) -> Result<Operand<'static>, CliError> {
    Ok(match name.parse::<Node>()? {
        Node::DType(dt) => Operand::DType(dt),
        Node::Weak(WeakKind::Int) => Operand::Scalar(Scalar::Int(0)),
        Node::Weak(WeakKind::Float) => Operand::Scalar(Scalar::Float(0.0)),
        Node::Weak(WeakKind::Complex) => Operand::complex(0.0, 0.0),
    })
}

fn smoke() -> Result<(), CliError> {
    let p = Promoter::new(PromotionConfig::DEFAULT);
    let pairs = [
        (DType::Int8, DType::Uint8),
        (DType::Int64, DType::Uint64),
        (DType::Float16, DType::Bfloat16),
        (DType::Complex64, DType::Float64),
        (DType::Float8E4m3fn, DType::Float32),
    ];
    println!("mode: {}, x64: {}\n", p.config.mode, p.config.x64);
    for (a, b) in pairs {
        match p.promote_types(a, b) {
            Ok(r) => println!("{a} + {b} -> {r}"),
            Err(e) => println!("{a} + {b} -> error: {e}"),
        }
    }
    let (dt, weak) = p.result_type_weak(&[Operand::from(1i64), Operand::from(2.5)])?;
    println!("1 + 2.5 -> {dt} (weak: {weak})");
    println!("\nAll smoke checks ran.");
    Ok(())
}

fn promote(names: &[String], mode: &str, no_x64: bool) -> Result<(), CliError> {
    let p = promoter(mode, no_x64)?;
    let args = names
        .iter()
        .map(|n| operand(n))
        .collect::<Result<Vec<_>, _>>()?;
    let (dt, weak) = p.result_type_weak(&args)?;
    if weak {
        println!("{dt} (weak)");
    } else {
        println!("{dt}");
    }
    Ok(())
}

fn cast(from: &str, to: &str, mode: &str, no_x64: bool) -> Result<(), CliError> {
    let p = promoter(mode, no_x64)?;
    let ok = p.can_cast_safely(from.parse()?, to.parse()?)?;
    println!("{ok}");
    Ok(())
}

fn info(name: &str) -> Result<(), CliError> {
    let dt: DType = name.parse()?;
    println!("{}", serde_json::to_string_pretty(&get_dtype_info(dt))?);
    Ok(())
}

fn table(mode: &str) -> Result<(), CliError> {
    let p = promoter(mode, false)?;
    let width = DType::ALL
        .iter()
        .map(|dt| dt.short_name().len())
        .max()
        .unwrap_or(4);
    print!("{:width$}", "");
    for dt in DType::ALL {
        print!(" {:>width$}", dt.short_name());
    }
    println!();
    for &a in DType::ALL {
        print!("{:width$}", a.short_name());
        for &b in DType::ALL {
            let cell = p
                .promote_types(a, b)
                .map_or_else(|_| "-".to_string(), |r| r.short_name());
            print!(" {cell:>width$}");
        }
        println!();
    }
    Ok(())
}
