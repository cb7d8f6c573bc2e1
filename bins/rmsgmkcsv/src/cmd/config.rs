use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use codec_csv::{parse_delimiter, CsvConfig};
use rmsg_api::{LinearSpec, RangeSpec};
use rmsg_pipeline::{generate_degrees, ExternalSpec, Strategy};

use super::error::CliError;
use super::output::Destination;

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub step: Option<i32>,
    pub output: Option<PathBuf>,
    pub truncate: Option<bool>,
    pub mcu: Option<i64>,
    pub mcustep: Option<i64>,
    pub grace_ms: Option<u64>,
    /// Программа и аргументы для `exec`, если после `--` ничего нет
    pub program: Option<Vec<String>>,
    #[serde(default)]
    pub csv: CsvConfig,
}

/// Конфиг по умолчанию; если его нет, берутся встроенные значения.
pub const DEFAULT_CONFIG: &str = "rmsgmkcsv.toml";

pub fn load_config(path: &str) -> Result<Config, CliError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| CliError::Config(format!("cannot read config {path}: {e}")))?;
    toml::from_str(&content).map_err(|e| CliError::Config(format!("bad config {path}: {e}")))
}

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Parser)]
#[command(
    name = "rmsgmkcsv",
    version,
    about = "Таблица CSV: градусы азимута -> целые значения для H-моста микроконтроллера"
)]
pub struct Cli {
    /// Путь к config.toml [по умолчанию: rmsgmkcsv.toml, если он есть]
    #[arg(long, global = true, env = "RMSGMKCSV_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Создать записи CSV: линейные значения или ответы внешней программы
    Create(CreateArgs),
}

#[derive(Args, Clone, Debug)]
pub struct CreateArgs {
    #[command(flatten)]
    pub flags: CreateFlags,

    #[command(subcommand)]
    pub mode: CreateMode,
}

#[derive(Args, Clone, Debug, Default)]
pub struct CreateFlags {
    /// Минимум в милли-градусах, напр. 0 = 0.0 градуса [по умолчанию: 0]
    #[arg(short = 'i', long, global = true, allow_negative_numbers = true)]
    pub min: Option<i64>,

    /// Максимум в милли-градусах, напр. 180000 = 180.0 градусов [по умолчанию: 360000]
    #[arg(short = 'a', long, global = true, allow_negative_numbers = true)]
    pub max: Option<i64>,

    /// Шаг в милли-градусах между записями, напр. 100: 1.0 -> 1.1 градуса [по умолчанию: 100]
    #[arg(short = 's', long, global = true, allow_negative_numbers = true)]
    pub step: Option<i32>,

    /// Писать в файл вместо stdout. Если файла ещё нет, нужен --truncate
    #[arg(short = 'o', long, global = true)]
    pub output: Option<PathBuf>,

    /// Создать/обнулить файл вместо дозаписи; --truncate=false отменяет truncate из конфига
    #[arg(
        short = 't',
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub truncate: Option<bool>,

    /// Значение MCU первой записи [по умолчанию: 0]
    #[arg(short = 'm', long, global = true, allow_negative_numbers = true)]
    pub mcu: Option<i64>,

    /// Приращение MCU между записями, может быть нулём или отрицательным [по умолчанию: 2]
    #[arg(short = 'u', long, global = true, allow_negative_numbers = true)]
    pub mcustep: Option<i64>,

    /// exec: сколько мс ждать самостоятельного выхода программы до kill [по умолчанию: 0]
    #[arg(long, global = true)]
    pub grace_ms: Option<u64>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum CreateMode {
    /// От --min до --max включительно, MCU растёт на --mcustep
    Linear,

    /// Спрашивать значение MCU у внешней программы.
    ///
    /// Каждая позиция уходит в stdin программы строкой в градусах ("1.1\n"),
    /// программа отвечает одной строкой с целым числом в stdout. После
    /// последней записи программа завершается через kill.
    #[command(after_help = "Example: rmsgmkcsv create exec -t -o csv.csv -- python3 ./example-script.py")]
    Exec(ExecArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ExecArgs {
    /// Программа и её аргументы
    #[arg(last = true, value_name = "PROGRAM")]
    pub command: Vec<String>,
}

// ═══════════════════════════════════════════════════════════════
//  Effective settings
// ═══════════════════════════════════════════════════════════════

/// Итоговая конфигурация после мержа: defaults < config.toml < env/CLI
#[derive(Debug)]
pub struct Effective {
    pub range: RangeSpec,
    pub strategy: Strategy,
    pub destination: Destination,
    pub csv: CsvConfig,
}

impl Effective {
    /// Явно заданный конфиг обязан существовать; отсутствие конфига по
    /// умолчанию не ошибка.
    pub fn new(config_path: Option<&str>, args: &CreateArgs) -> Result<Self, CliError> {
        let cfg = match config_path {
            Some(path) => load_config(path)?,
            None if Path::new(DEFAULT_CONFIG).exists() => load_config(DEFAULT_CONFIG)?,
            None => Config::default(),
        };
        Self::merge(cfg, args)
    }

    fn merge(cfg: Config, args: &CreateArgs) -> Result<Self, CliError> {
        let flags = &args.flags;
        let defaults = RangeSpec::default();
        let range = RangeSpec {
            min: flags.min.or(cfg.min).unwrap_or(defaults.min),
            max: flags.max.or(cfg.max).unwrap_or(defaults.max),
            step: flags.step.or(cfg.step).unwrap_or(defaults.step),
        };

        // Ошибки диапазона до открытия выхода и запуска программы
        generate_degrees(&range)?;

        let strategy = match &args.mode {
            CreateMode::Linear => {
                let defaults = LinearSpec::default();
                Strategy::Linear(LinearSpec {
                    start: flags.mcu.or(cfg.mcu).unwrap_or(defaults.start),
                    step: flags.mcustep.or(cfg.mcustep).unwrap_or(defaults.step),
                })
            }
            CreateMode::Exec(exec) => {
                let command = if exec.command.is_empty() {
                    cfg.program.unwrap_or_default()
                } else {
                    exec.command.clone()
                };
                let grace = Duration::from_millis(flags.grace_ms.or(cfg.grace_ms).unwrap_or(0));
                let spec = ExternalSpec::from_command(&command, grace).ok_or(CliError::NoProgram)?;
                Strategy::External(spec)
            }
        };

        let destination = match flags.output.clone().or(cfg.output) {
            Some(path) => Destination::File {
                path,
                truncate: flags.truncate.or(cfg.truncate).unwrap_or(false),
            },
            None => Destination::Stdout,
        };

        parse_delimiter(&cfg.csv.delimiter).map_err(|e| CliError::Config(e.to_string()))?;

        Ok(Self { range, strategy, destination, csv: cfg.csv })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmsg_pipeline::GenerateError;

    fn parse(argv: &[&str]) -> CreateArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Create(args) => args,
        }
    }

    fn merged(toml_text: &str, argv: &[&str]) -> Result<Effective, CliError> {
        let cfg: Config = toml::from_str(toml_text).unwrap();
        Effective::merge(cfg, &parse(argv))
    }

    #[test]
    fn defaults_match_full_circle() {
        let eff = merged("", &["rmsgmkcsv", "create", "linear"]).unwrap();
        assert_eq!(eff.range, RangeSpec { min: 0, max: 360_000, step: 100 });
        assert!(matches!(eff.strategy, Strategy::Linear(LinearSpec { start: 0, step: 2 })));
        assert_eq!(eff.destination, Destination::Stdout);
        assert_eq!(eff.csv.delimiter, ",");
        assert!(eff.csv.crlf);
    }

    #[test]
    fn short_flags_before_and_after_mode() {
        let eff = merged(
            "",
            &["rmsgmkcsv", "create", "-i", "-1000", "linear", "-a", "5000", "-s", "250", "-m", "-7", "-u", "-3"],
        )
        .unwrap();
        assert_eq!(eff.range, RangeSpec { min: -1000, max: 5000, step: 250 });
        assert!(matches!(eff.strategy, Strategy::Linear(LinearSpec { start: -7, step: -3 })));
    }

    #[test]
    fn cli_overrides_config_file() {
        let eff = merged(
            "min = 10\nmax = 20\nstep = 5\nmcu = 100\noutput = \"a.csv\"\n[csv]\ndelimiter = \";\"\ncrlf = false\n",
            &["rmsgmkcsv", "create", "--max", "30", "linear"],
        )
        .unwrap();
        assert_eq!(eff.range, RangeSpec { min: 10, max: 30, step: 5 });
        assert!(matches!(eff.strategy, Strategy::Linear(LinearSpec { start: 100, step: 2 })));
        assert_eq!(
            eff.destination,
            Destination::File { path: PathBuf::from("a.csv"), truncate: false }
        );
        assert_eq!(eff.csv.delimiter, ";");
        assert!(!eff.csv.crlf);
    }

    #[test]
    fn exec_takes_program_after_double_dash() {
        let eff = merged(
            "",
            &["rmsgmkcsv", "create", "-t", "-o", "csv.csv", "--grace-ms", "250", "exec", "--", "python3", "./example-script.py"],
        )
        .unwrap();
        match eff.strategy {
            Strategy::External(spec) => {
                assert_eq!(spec.program, "python3");
                assert_eq!(spec.args, vec!["./example-script.py"]);
                assert_eq!(spec.grace, Duration::from_millis(250));
            }
            other => panic!("unexpected strategy {other:?}"),
        }
        assert_eq!(
            eff.destination,
            Destination::File { path: PathBuf::from("csv.csv"), truncate: true }
        );
    }

    #[test]
    fn exec_falls_back_to_configured_program() {
        let eff = merged("program = [\"./calib\", \"--fast\"]\n", &["rmsgmkcsv", "create", "exec"]).unwrap();
        assert!(matches!(eff.strategy, Strategy::External(ref s) if s.program == "./calib"));
    }

    #[test]
    fn exec_without_program_fails() {
        let err = merged("", &["rmsgmkcsv", "create", "exec"]).unwrap_err();
        assert!(matches!(err, CliError::NoProgram));
    }

    #[test]
    fn pre_run_checks() {
        let err = merged("", &["rmsgmkcsv", "create", "--min", "5", "--max", "4", "linear"]).unwrap_err();
        assert!(matches!(err, CliError::Generate(GenerateError::RangeInverted { min: 5, max: 4 })));

        let err = merged("", &["rmsgmkcsv", "create", "--step", "-1", "linear"]).unwrap_err();
        assert!(matches!(err, CliError::Generate(GenerateError::StepLessThanZero { step: -1 })));

        let err = merged("", &["rmsgmkcsv", "create", "--step", "0", "linear"]).unwrap_err();
        assert!(matches!(err, CliError::Generate(GenerateError::StepIsZero)));

        let eff = merged("", &["rmsgmkcsv", "create", "-i", "7", "-a", "7", "-s", "0", "linear"]).unwrap();
        assert_eq!(eff.range, RangeSpec { min: 7, max: 7, step: 0 });

        let err = merged("", &["rmsgmkcsv", "create", "-i", "7", "-a", "7", "-s", "-1", "linear"]).unwrap_err();
        assert!(matches!(err, CliError::Generate(GenerateError::StepLessThanZero { step: -1 })));

        let err = merged("[csv]\ndelimiter = \"ab\"\n", &["rmsgmkcsv", "create", "linear"]).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        assert!(toml::from_str::<Config>("stepp = 1\n").is_err());
    }

    #[test]
    fn missing_default_config_means_defaults() {
        // Тесты запускаются из каталога крейта, rmsgmkcsv.toml там нет
        let args = parse(&["rmsgmkcsv", "create", "linear"]);
        let eff = Effective::new(None, &args).unwrap();
        assert_eq!(eff.range, RangeSpec::default());
    }

    #[test]
    fn missing_explicit_config_fails() {
        let args = parse(&["rmsgmkcsv", "create", "linear"]);
        let err = Effective::new(Some("/nonexistent/typo.toml"), &args).unwrap_err();
        assert!(matches!(err, CliError::Config(ref msg) if msg.contains("typo.toml")));
    }

    #[test]
    fn explicit_config_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calib.toml");
        std::fs::write(&path, "max = 500\nstep = 250\n").unwrap();
        let args = parse(&["rmsgmkcsv", "create", "linear"]);
        let eff = Effective::new(path.to_str(), &args).unwrap();
        assert_eq!(eff.range, RangeSpec { min: 0, max: 500, step: 250 });
    }

    #[test]
    fn truncate_flag_overrides_config_both_ways() {
        let file_cfg = "output = \"a.csv\"\ntruncate = true\n";
        let truncate = |argv: &[&str]| match merged(file_cfg, argv).unwrap().destination {
            Destination::File { truncate, .. } => truncate,
            Destination::Stdout => panic!("expected a file destination"),
        };

        assert!(truncate(&["rmsgmkcsv", "create", "linear"]));
        assert!(!truncate(&["rmsgmkcsv", "create", "--truncate=false", "linear"]));
        assert!(!truncate(&["rmsgmkcsv", "create", "linear", "-t=false"]));
        assert!(truncate(&["rmsgmkcsv", "create", "-t", "linear"]));

        let eff = merged("output = \"a.csv\"\n", &["rmsgmkcsv", "create", "--truncate", "linear"]).unwrap();
        assert_eq!(eff.destination, Destination::File { path: PathBuf::from("a.csv"), truncate: true });
    }
}
