use jsonkit::{
    encode_compact, encode_debug, encode_pretty, parse_and_validate, parse_with_options,
    ParserOptions, Schema, Value, Verdict,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use structopt::StructOpt;

#[derive(Debug, Clone, Copy)]
enum OutputType {
    Minimal,
    Pretty,
    Debug,
}

impl FromStr for OutputType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "minimal" => Ok(OutputType::Minimal),
            "pretty" => Ok(OutputType::Pretty),
            "debug" => Ok(OutputType::Debug),
            _ => Err(format!(
                "invalid output type '{}', expected minimal, pretty or debug",
                value
            )),
        }
    }
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "jso",
    about = "Parse, encode and validate JSON against JSON Schema draft-04."
)]
struct Options {
    /// Maximum allowed object nesting depth (0 means unlimited)
    #[structopt(short = "d", long = "depth", default_value = "0")]
    depth: u32,

    /// Resulting JSON output type - either minimal, pretty or debug
    #[structopt(short = "o", long = "output-type", default_value = "minimal")]
    output_type: OutputType,

    /// JSON Schema file used for validation
    #[structopt(short = "s", long = "schema", parse(from_os_str))]
    schema: Option<PathBuf>,

    /// Input file
    #[structopt(parse(from_os_str))]
    file: PathBuf,
}

fn read_file(path: &Path) -> Result<Vec<u8>, i32> {
    fs::read(path).map_err(|err| {
        eprintln!("Opening the file '{}' failed: {}", path.display(), err);
        1
    })
}

fn parse_file(path: &Path, options: &ParserOptions) -> Result<Value, i32> {
    let input = read_file(path)?;
    parse_with_options(&input, options).map_err(|err| {
        let location = err.location();
        eprintln!(
            "Parsing {} error in {}:{}:{}",
            err.kind(),
            path.display(),
            location.first_line,
            location.first_column
        );
        1
    })
}

fn load_schema(path: &Path, options: &ParserOptions) -> Result<Schema, i32> {
    let document = parse_file(path, options)?;
    Schema::compile(&document).map_err(|err| {
        eprintln!("{}", err);
        1
    })
}

fn run(options: &Options) -> i32 {
    let parser_options = ParserOptions {
        max_depth: options.depth,
    };
    let schema = match &options.schema {
        None => None,
        Some(path) => match load_schema(path, &parser_options) {
            Ok(schema) => Some(schema),
            Err(code) => return code,
        },
    };

    let input = match read_file(&options.file) {
        Ok(input) => input,
        Err(code) => return code,
    };
    let parsed = match &schema {
        Some(schema) => {
            parse_and_validate(&input, schema, &parser_options).map(|(value, verdict)| {
                (value, Some(verdict))
            })
        }
        None => parse_with_options(&input, &parser_options).map(|value| (value, None)),
    };
    let (value, verdict) = match parsed {
        Ok(result) => result,
        Err(err) => {
            let location = err.location();
            eprintln!(
                "Parsing {} error in {}:{}:{}",
                err.kind(),
                options.file.display(),
                location.first_line,
                location.first_column
            );
            return 1;
        }
    };

    let mut code = 0;
    match verdict {
        None | Some(Verdict::Valid) => {}
        Some(Verdict::Invalid(error)) => {
            eprintln!("{}", error);
            code = 1;
        }
        Some(Verdict::Error(error)) => {
            eprintln!("{}", error);
            code = 1;
        }
    }

    match options.output_type {
        // The debug dump is printed even for rejected documents.
        OutputType::Debug => print!("{}", encode_debug(&value)),
        OutputType::Minimal if code == 0 => println!("{}", encode_compact(&value)),
        OutputType::Pretty if code == 0 => println!("{}", encode_pretty(&value)),
        _ => {}
    }
    code
}

fn main() {
    let options = Options::from_args();
    std::process::exit(run(&options));
}
