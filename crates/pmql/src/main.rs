use std::io;
use std::sync::Arc;

use clap::Parser;
use pmql_core::functions::FunctionPool;
use pmql_core::scalar::ScalarValue;
use pmql_error::{PmqlError, Result};

#[derive(Parser)]
#[clap(name = "pmql")]
struct Arguments {
    /// Expression to evaluate, e.g. '((${a} + int{1}) * ${b})'.
    expression: String,

    /// Variable substitution as name=value, repeatable.
    ///
    /// Values use literal syntax (`int{42}`, `float{0.5}`, `bool{true}`,
    /// `string{'hi'}`, `null`). Bare integers, floats and booleans are
    /// also accepted; anything else is taken as a string.
    #[clap(short, long = "var", value_name = "NAME=VALUE")]
    vars: Vec<String>,

    /// Print the compiled expression and the per-op evaluation log.
    #[clap(long)]
    explain: bool,

    /// Evaluate without caching op results.
    #[clap(long)]
    no_cache: bool,
}

fn main() {
    let args = Arguments::parse();
    logutil::configure_global_logger(
        tracing::Level::ERROR,
        logutil::LogFormat::HumanReadable,
        io::stderr,
    );

    if let Err(err) = run(args) {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}

fn run(args: Arguments) -> Result<()> {
    let pool = Arc::new(FunctionPool::builtin());
    let expr = pmql_core::parse(&args.expression, pool)?;

    let mut ctx = expr.context(!args.no_cache);
    for var in &args.vars {
        let (name, value) = parse_var(var)?;
        ctx.set_by_name(name, value)?;
    }

    if args.explain {
        print!("{expr}");
    }

    let outcome = expr.eval(&mut ctx);
    if args.explain {
        println!("Evaluation:");
        print!("{}", expr.log(&ctx));
    }

    println!("{}", outcome?);
    Ok(())
}

fn parse_var(spec: &str) -> Result<(&str, ScalarValue)> {
    let (name, raw) = spec.split_once('=').ok_or_else(|| {
        PmqlError::new("Invalid variable, expected name=value").with_field("got", spec)
    })?;
    Ok((name, parse_value(raw)?))
}

/// Parse a substitution value. Typed literal syntax wins, then the obvious
/// scalar interpretations, then a plain string.
fn parse_value(raw: &str) -> Result<ScalarValue> {
    if raw == "null" {
        return Ok(ScalarValue::Null);
    }
    if let Some((ty, rest)) = raw.split_once('{') {
        if let Some(payload) = rest.strip_suffix('}') {
            return ScalarValue::parse_typed(ty, payload);
        }
    }
    if raw == "true" {
        return Ok(ScalarValue::Boolean(true));
    }
    if raw == "false" {
        return Ok(ScalarValue::Boolean(false));
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(ScalarValue::Int64(v));
    }
    if let Ok(v) = raw.parse::<f64>() {
        return Ok(ScalarValue::Float64(v));
    }
    Ok(ScalarValue::Utf8(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_variable_specs() {
        assert_eq!(
            ("a", ScalarValue::Int64(42)),
            parse_var("a=42").unwrap()
        );
        assert_eq!(
            ("a", ScalarValue::Int64(42)),
            parse_var("a=int{42}").unwrap()
        );
        assert_eq!(("b", ScalarValue::Null), parse_var("b=null").unwrap());
        assert_eq!(
            ("c", ScalarValue::Float64(0.5)),
            parse_var("c=0.5").unwrap()
        );
        assert_eq!(
            ("d", ScalarValue::Boolean(true)),
            parse_var("d=true").unwrap()
        );
        assert_eq!(
            ("e", ScalarValue::Utf8("hello world".to_string())),
            parse_var("e=hello world").unwrap()
        );

        assert!(parse_var("novalue").is_err());
        assert!(parse_var("f=int{nope}").is_err());
    }
}
