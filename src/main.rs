use std::io::{self, BufRead, IsTerminal, Read, Write};

use anyhow::{anyhow, Result};
use clap::Parser;

use indic_translator::{languages, Config, Language};

#[derive(Parser, Debug)]
#[command(
    name = "indic-translator",
    version,
    about = "Translate English text or images into Indian languages and read it aloud"
)]
struct Cli {
    /// Text to translate (reads stdin when omitted)
    text: Vec<String>,

    /// Target language name or code (Hindi, Marathi, Bengali, Gujarati, Tamil, Telugu)
    #[arg(short = 'l', long = "lang", default_value = "Hindi")]
    lang: String,

    /// Source language
    #[arg(short = 'L', long = "source-lang", default_value = "English")]
    source_lang: String,

    /// Translation backend as provider or provider:model (e.g. huggingface, openai:gpt-4o-mini)
    #[arg(short = 'm', long = "model")]
    model: Option<String>,

    /// API key (overrides environment variables)
    #[arg(short = 'k', long = "key")]
    key: Option<String>,

    /// Image (png/jpg/jpeg) to extract text from before translating
    #[arg(short = 'i', long = "image")]
    image: Option<String>,

    /// Read the translation aloud
    #[arg(long = "speak")]
    speak: bool,

    /// Write the spoken translation to a WAV file
    #[arg(long = "speak-out")]
    speak_out: Option<String>,

    /// Start the web form instead of translating once
    #[arg(long = "serve")]
    serve: bool,

    /// Address for --serve (default from settings)
    #[arg(long = "addr")]
    addr: Option<String>,

    /// Show supported languages and exit
    #[arg(long = "show-enabled-languages")]
    show_enabled_languages: bool,

    /// Show installed tesseract languages and exit
    #[arg(long = "show-ocr-languages")]
    show_ocr_languages: bool,

    /// Append token usage to output
    #[arg(long = "with-using-tokens")]
    with_using_tokens: bool,

    /// Append model name to output
    #[arg(long = "with-using-model")]
    with_using_model: bool,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,

    /// Interactive mode
    #[arg(long = "interactive")]
    interactive: bool,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            lang: self.lang.clone(),
            source_lang: self.source_lang.clone(),
            model: self.model.clone(),
            key: self.key.clone(),
            image: self.image.clone(),
            speak: self.speak,
            speak_out: self.speak_out.clone(),
            settings_path: self.read_settings.clone(),
            show_enabled_languages: self.show_enabled_languages,
            show_ocr_languages: self.show_ocr_languages,
            with_using_tokens: self.with_using_tokens,
            with_using_model: self.with_using_model,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    indic_translator::logging::init(cli.verbose, cli.serve)?;

    if cli.serve {
        return indic_translator::serve(cli.config(), cli.addr.clone()).await;
    }
    if cli.interactive {
        return run_interactive(cli.config()).await;
    }

    let needs_input =
        !(cli.show_enabled_languages || cli.show_ocr_languages || cli.image.is_some());
    let input = if !needs_input {
        None
    } else if !cli.text.is_empty() {
        Some(cli.text.join(" "))
    } else if io::stdin().is_terminal() {
        return Err(anyhow!("no input text (pass text, pipe stdin, or use --image)"));
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Some(buffer)
    };

    let output = indic_translator::run(cli.config(), input).await?;
    println!("{}", output);
    Ok(())
}

async fn run_interactive(mut config: Config) -> Result<()> {
    println!("Interactive mode. Use /quit or /exit to finish.");
    println!("Type /help to see available commands.");

    let mut line = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();
    loop {
        line.clear();
        print!("> ");
        io::stdout().flush()?;
        if stdin_lock.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.starts_with('/') {
            match handle_interactive_command(input, &mut config).await {
                Ok(true) => break,
                Ok(false) => {}
                Err(err) => eprintln!("error: {:#}", err),
            }
            continue;
        }

        let mut run_config = config.clone();
        run_config.image = None;
        match indic_translator::run(run_config, Some(input.to_string())).await {
            Ok(output) => println!("{}", output),
            Err(err) => eprintln!("error: {:#}", err),
        }
    }
    Ok(())
}

async fn handle_interactive_command(input: &str, config: &mut Config) -> Result<bool> {
    let (command, arg) = split_command(input);
    match command {
        "/quit" | "/exit" => return Ok(true),
        "/help" => print_interactive_help(),
        "/show-enabled-languages" => {
            let mut run_config = config.clone();
            run_config.show_enabled_languages = true;
            println!("{}", indic_translator::run(run_config, None).await?);
        }
        "/lang" if arg.is_empty() => println!("lang: {}", config.lang),
        "/lang" => {
            let language = parse_target(arg)?;
            config.lang = language.name().to_string();
            println!("lang set to {}", language);
        }
        "/image" if arg.is_empty() => eprintln!("usage: /image <path>"),
        "/image" => {
            let mut run_config = config.clone();
            run_config.image = Some(arg.to_string());
            println!("{}", indic_translator::run(run_config, None).await?);
        }
        "/speak" => {
            config.speak = parse_toggle(arg, config.speak)?;
            println!("speak: {}", config.speak);
        }
        "/model" if arg.is_empty() => {
            println!("model: {}", config.model.as_deref().unwrap_or("(settings)"));
        }
        "/model" => {
            config.model = Some(arg.to_string());
            println!("model set to {}", arg);
        }
        _ => eprintln!("unknown command: {}", command),
    }
    Ok(false)
}

fn split_command(input: &str) -> (&str, &str) {
    let trimmed = input.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (trimmed, ""),
    }
}

fn parse_target(value: &str) -> Result<Language> {
    let language = Language::parse(value)?;
    languages::validate_pair(Language::English, language)?;
    Ok(language)
}

fn parse_toggle(arg: &str, current: bool) -> Result<bool> {
    let value = arg.trim();
    if value.is_empty() {
        return Ok(!current);
    }
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(anyhow!("expected on/off/true/false/1/0")),
    }
}

fn print_interactive_help() {
    println!("Commands:");
    println!("  /quit, /exit                 Exit interactive mode");
    println!("  /show-enabled-languages      Show supported languages");
    println!("  /lang <name|code>            Set target language (or show current)");
    println!("  /image <path>                Extract text from an image and translate it");
    println!("  /speak [on|off]              Toggle reading translations aloud");
    println!("  /model <provider[:model]>    Set translation backend (or show current)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_match_whole_words() {
        assert_eq!(split_command("/lang  ta "), ("/lang", "ta"));
        assert_eq!(split_command("/language"), ("/language", ""));
        assert_eq!(split_command("/speaker on"), ("/speaker", "on"));
        assert_eq!(split_command("/image ~/my scans/sign.png"), ("/image", "~/my scans/sign.png"));
    }

    #[test]
    fn lang_only_accepts_targets() {
        assert_eq!(parse_target("te").unwrap(), Language::Telugu);
        assert!(parse_target("English").is_err());
        assert!(parse_target("Klingon").is_err());
    }

    #[test]
    fn toggle_values() {
        assert!(parse_toggle("", false).unwrap());
        assert!(!parse_toggle("off", true).unwrap());
        assert!(parse_toggle("maybe", true).is_err());
    }

    #[tokio::test]
    async fn bad_command_arguments_keep_state() {
        let mut config = Config::default();
        assert!(handle_interactive_command("/speak maybe", &mut config).await.is_err());
        assert!(!config.speak);
        assert!(handle_interactive_command("/lang English", &mut config).await.is_err());
        assert_eq!(config.lang, "Hindi");
        assert!(!handle_interactive_command("/speaker on", &mut config).await.unwrap());
        assert!(!config.speak);
        assert!(handle_interactive_command("/exit", &mut config).await.unwrap());
    }
}
