use clap::{ArgGroup, Parser};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use sqlsieve_core::{
    format_file, Classifier, ConsoleSink, Discoverer, HtmlSearchProvider, HttpClient, ScanConfig,
    SieveError, SinkRef, Verdict,
};

#[derive(Parser, Debug)]
#[command(
    name = "sqlsieve",
    version,
    about = "Finds pages that leak database errors and sorts them into vulnerable / not exploitable lists",
    override_usage = "sqlsieve (-f <FILE> | -d) <options>",
    group(ArgGroup::new("source").required(true).args(["file", "default"])),
    after_help = "\x1b[1;36mEXAMPLES:\x1b[0m
  Scan a list of URLs:            sqlsieve -f sites.txt
  Search and scan:                sqlsieve -d
  Custom search query:            sqlsieve -d -q \"inurl:item.php?id=\"
  Start from empty result lists:  sqlsieve -f sites.txt --reset
  Through a proxy:                sqlsieve -d --proxy socks5://127.0.0.1:9050
  List targets without probing:   sqlsieve -f sites.txt --dry-run

Timeouts and connection/TLS errors count as not exploitable. Any other probe failure,
such as a redirect loop, stops the run; sites checked before it stay recorded."
)]
pub struct Args {
    #[arg(short = 'f', long, help = "Format FILE (one URL per line) and scan it")]
    pub file: Option<PathBuf>,

    #[arg(
        short = 'd',
        long,
        help = "Search for targets and scan the results. A target that fails with anything \
                other than a timeout or connection/TLS error (e.g. a redirect loop) stops the run"
    )]
    pub default: bool,

    #[arg(short = 'q', long, help = "Search query fragment used with -d")]
    pub query: Option<String>,

    #[arg(short = 'c', long, help = "JSON config file; command-line flags take precedence")]
    pub config: Option<PathBuf>,

    #[arg(long, default_value_t = false, help = "Truncate both result lists before scanning")]
    pub reset: bool,

    #[arg(long, help = "Request timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(long, help = "Proxy URL (e.g. http://127.0.0.1:8080)")]
    pub proxy: Option<String>,

    #[arg(short = 'H', long = "header", help = "Custom header (e.g. \"Cookie: sess=abc\")")]
    pub headers: Vec<String>,

    #[arg(long, default_value_t = false, help = "Accept invalid TLS certificates")]
    pub insecure: bool,

    #[arg(short = 'v', long, default_value_t = false, help = "Show the whole process (Verbose Mode)")]
    pub verbose: bool,

    #[arg(long, default_value_t = false, help = "List targets without sending any probe")]
    pub dry_run: bool,
}

#[tokio::main]
async fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let args = Args::parse();

    init_logging(args.verbose);
    print_banner();

    let config = match build_config(&args) {
        Ok(c) => c,
        Err(e) => fail(&format!("[!] {}", e)),
    };
    debug!("effective config: {:?}", config);
    let sink = ConsoleSink::new_ref(config.verbose);

    if let Err(e) = run(&args, &config, &sink).await {
        fail(&format!("[!] {}", e));
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "sqlsieve_core=debug,sqlsieve=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn fail(message: &str) -> ! {
    eprint!("{}\r\n", message.red());
    process::exit(1);
}

/// Config file first, then command-line overrides.
fn build_config(args: &Args) -> anyhow::Result<ScanConfig> {
    let mut config = match args.config {
        Some(ref path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };

    if let Some(ref q) = args.query {
        config.search_query = q.clone();
    }
    if let Some(t) = args.timeout {
        config.timeout = t;
    }
    if let Some(ref p) = args.proxy {
        config.proxy = p.clone();
    }
    config.headers.extend(args.headers.iter().cloned());
    config.insecure |= args.insecure;
    config.verbose |= args.verbose;
    config.dry_run |= args.dry_run;

    Ok(config)
}

/// Produces the target list for the chosen mode, then classifies it.
async fn run(args: &Args, config: &ScanConfig, sink: &SinkRef) -> anyhow::Result<()> {
    print_scan_config(args, config);

    let client = Arc::new(HttpClient::new(
        config.timeout,
        config.proxy_ref(),
        &config.parsed_headers(),
        config.insecure,
    )?);

    let file_mode = args.file.is_some();

    if let Some(ref input) = args.file {
        sink.on_log("phase", "[*] Formatting target file...");
        match format_file(input, &config.formatted_targets, sink) {
            Ok(_) => {}
            Err(e @ SieveError::InputMissing(_)) => fail(&format!("[!] {}", e)),
            Err(e) => return Err(e.into()),
        }
    } else {
        sink.on_log("phase", "[*] Searching for targets...");
        let provider = Arc::new(HtmlSearchProvider::new(Arc::clone(&client)));
        let discoverer = Discoverer::new(
            provider,
            config.search_query.clone(),
            config.discovered_targets.clone(),
            Arc::clone(sink),
        );

        let spinner = search_spinner();
        let discovered = discoverer.discover().await;
        spinner.finish_and_clear();
        discovered?;
    }

    let store = config.outcome_store();
    let classifier = Classifier::new(client, store.clone(), config.target_sources(), Arc::clone(sink));

    if config.dry_run {
        for target in classifier.pending_targets(file_mode)? {
            println!("[DRY RUN] Would scan target: {}", target);
        }
        return Ok(());
    }

    if args.reset {
        store.reset_all()?;
        sink.on_log("warn", "[*] Result lists truncated.");
    }

    let summary = classifier.run(file_mode).await?;
    sink.on_log(
        "success",
        &format!(
            "[+] Scanned {} target(s): {} vulnerable, {} not exploitable",
            summary.scanned, summary.vulnerable, summary.not_exploitable
        ),
    );

    print_summary_report(classifier.store())?;
    Ok(())
}

fn search_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("waiting for search results");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Prints the sqlsieve ASCII banner.
fn print_banner() {
    let banner = r#"
   ____   ___  _     ____  _
  / ___| / _ \| |   / ___|(_) _____   _____
  \___ \| | | | |   \___ \| |/ _ \ \ / / _ \
   ___) | |_| | |___ ___) | |  __/\ V /  __/
  |____/ \__\_\_____|____/|_|\___| \_/ \___|
    "#;
    print!("{}\r\n", banner.bright_cyan().bold());
    print!("{}\r\n", "──────────────────────────────────────────────────".dimmed());
    std::io::stdout().flush().ok();
}

fn print_scan_config(args: &Args, config: &ScanConfig) {
    match args.file {
        Some(ref f) => print!("{}\r\n", format!("[+] Source:     file {}", f.display()).green().bold()),
        None => print!("{}\r\n", format!("[+] Source:     search \"{}\"", config.search_query).green().bold()),
    }
    print!("{}\r\n", format!("[+] Timeout:    {}s", config.timeout).blue());
    print!("{}\r\n", format!("[+] Vulnerable: {}", config.vulnerable_list.display()).blue());
    print!("{}\r\n", format!("[+] Clean:      {}", config.not_exploitable_list.display()).blue());
    if let Some(proxy) = config.proxy_ref() {
        print!("{}\r\n", format!("[+] Proxy:      {}", proxy).yellow());
    }
    if !config.headers.is_empty() {
        print!("{}\r\n", format!("[+] Headers:    {} custom", config.headers.len()).yellow());
    }
    if config.insecure {
        print!("{}\r\n", "[+] TLS:        invalid certificates accepted".yellow());
    }
    print!("{}\r\n", "──────────────────────────────────────────────────".dimmed());
    std::io::stdout().flush().ok();
}

/// Reads both result lists back and prints them.
fn print_summary_report(store: &sqlsieve_core::OutcomeStore) -> anyhow::Result<()> {
    let vulnerable = store.read(Verdict::Vulnerable)?;
    let not_exploitable = store.read(Verdict::NotExploitable)?;

    print!("\r\n{}\r\n", "SCAN SUMMARY :".yellow().bold());
    if vulnerable.is_empty() {
        print!("{}\r\n", "  No vulnerable sites recorded.".green());
    } else {
        print!("  {} vulnerable site(s):\r\n", vulnerable.len().to_string().white().bold());
        for (i, site) in vulnerable.iter().enumerate() {
            print!("  #{} {}\r\n", i + 1, site.red().bold());
        }
    }
    print!(
        "  {} site(s) not exploitable (saved to {})\r\n",
        not_exploitable.len().to_string().white().bold(),
        store.path(Verdict::NotExploitable).display()
    );
    std::io::stdout().flush().ok();
    Ok(())
}
