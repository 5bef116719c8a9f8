use std::time::{Duration, Instant};

use clap::Parser;
use colored::*;
use tracing_subscriber::EnvFilter;

use scical::config::ERROR_MARKER;
use scical::{basic_calculate, calculate, calculate_with, vector_calculate, Conditions};

#[derive(Debug, Parser)]
#[command(name = "scical", about = "Scientific calculator expression engine")]
struct Cli {
    /// Expressions to evaluate, e.g. "d/dx[x^2]" or "lim[1/x] as x->0".
    expressions: Vec<String>,

    /// Run a vector operation: OP A [B], e.g. --vector dot "[1,2]" "[3,4]".
    #[arg(long, num_args = 2..=3, value_names = ["OP", "A", "B"])]
    vector: Option<Vec<String>>,

    /// Differentiation variable for d/d[...].
    #[arg(long)]
    wrt: Option<String>,

    /// Limit point for lim[...] without an `as` clause, e.g. "x->0".
    #[arg(long, allow_hyphen_values = true)]
    limit: Option<String>,

    /// Lower bound of a definite integral.
    #[arg(long, allow_hyphen_values = true)]
    lower: Option<String>,

    /// Upper bound of a definite integral.
    #[arg(long, allow_hyphen_values = true)]
    upper: Option<String>,

    /// First index of a Σ[...] sum.
    #[arg(long, allow_hyphen_values = true)]
    sum_from: Option<String>,

    /// Last index of a Σ[...] sum.
    #[arg(long, allow_hyphen_values = true)]
    sum_to: Option<String>,

    /// Use the four-function calculator.
    #[arg(long)]
    basic: bool,

    /// Run the built-in showcase.
    #[arg(long)]
    demo: bool,
}

impl Cli {
    fn conditions(&self) -> Conditions {
        Conditions {
            wrt: self.wrt.clone(),
            limit: self.limit.clone(),
            lower: self.lower.clone(),
            upper: self.upper.clone(),
            sum_from: self.sum_from.clone(),
            sum_to: self.sum_to.clone(),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.demo {
        run_demo();
        return;
    }

    if let Some(args) = &cli.vector {
        let (op, a, b) = (&args[0], &args[1], args.get(2).map(String::as_str));
        let label = match b {
            Some(b) => format!("{} {} {}", op, a, b),
            None => format!("{} {}", op, a),
        };
        run_test(&label, || vector_calculate(op, a, b));
    }

    let conditions = cli.conditions();
    for expr in &cli.expressions {
        if cli.basic {
            run_test(expr, || basic_calculate(expr));
        } else {
            run_test(expr, || calculate_with(expr, &conditions));
        }
    }
}

fn run_demo() {
    println!("{}", "=== SCICAL EXPRESSION ENGINE ===\n".magenta().bold());

    let standard = vec![
        "2 + 2",
        "6 × 7",
        "sin(π/2)",
        "2(3 + 1)^2",
        "log(e)",
        "1/0",
        "sqrt(-1)",
    ];
    let calculus = vec![
        "d/dx[x^2]",
        "d/dx[x*sin(x)]",
        "d/dx[exp(2x)]",
        "∫[x]dx",
        "∫[cos(x)]dx",
        "∫[x*exp(x)]dx",
        "∫[1/(x^2+1)]dx",
        "lim[sin(x)/x] as x->0",
        "lim[1/x] as x->0-",
        "lim[(x^2-1)/(x^2+1)] as x->∞",
    ];
    let vectors = vec![
        ("add", "[1,2]", Some("[2,3]")),
        ("dot", "[1,2]", Some("[3,4]")),
        ("cross", "[1,0,0]", Some("[0,1,0]")),
        ("det", "[[1,2],[3,4]]", None),
        ("norm", "[3,4]", None),
        ("deriv", "[x, x^2, x^3]", None),
        ("add", "[1,2]", Some("[1,2,3]")),
    ];

    println!("{}", "--- Standard Tests ---".white().bold());
    let start = Instant::now();
    for t in &standard {
        run_test(t, || calculate(t));
    }
    let std_time = start.elapsed();

    println!("\n{}", "--- Calculus Tests ---".white().bold());
    let start = Instant::now();
    for t in &calculus {
        run_test(t, || calculate(t));
    }
    let calc_time = start.elapsed();

    println!("\n{}", "--- Vector Tests ---".white().bold());
    let start = Instant::now();
    for (op, a, b) in &vectors {
        let label = match b {
            Some(b) => format!("{} {} {}", op, a, b),
            None => format!("{} {}", op, a),
        };
        run_test(&label, || vector_calculate(op, a, *b));
    }
    let vec_time = start.elapsed();

    let total = standard.len() + calculus.len() + vectors.len();
    let elapsed = std_time + calc_time + vec_time;
    println!("\n{}", "=== PERFORMANCE SUMMARY ===".magenta().bold());
    println!("Standard tests ({} expressions): {:?}", standard.len(), std_time);
    println!("Calculus tests ({} expressions): {:?}", calculus.len(), calc_time);
    println!("Vector tests ({} operations):    {:?}", vectors.len(), vec_time);
    println!("Total:                          {:?}", elapsed);
    println!("Average per calculation:        {:?}", average(elapsed, total));
}

fn average(elapsed: Duration, count: usize) -> Duration {
    elapsed / count.max(1) as u32
}

fn run_test(input: &str, calc: impl FnOnce() -> String) {
    println!("{}{}", "Input:  ".cyan().bold(), input.cyan());

    let output = calc();
    if output == ERROR_MARKER {
        println!("{}", "Result: ERROR".red());
    } else {
        println!("{}{}", "Result: ".green(), output.green());
    }

    println!("{}", "-".repeat(40));
}
