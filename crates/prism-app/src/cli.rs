use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Prism: chat, media description, image generation, and grounded search
/// on top of the Gemini API.
#[derive(Parser, Debug)]
#[command(name = "prism", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter directive override (e.g. `prism=debug`).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Interactive streaming chat (the default).
    Chat {
        /// System instruction for the session.
        #[arg(long)]
        system: Option<String>,
    },
    /// Describe an image file.
    DescribeImage {
        file: PathBuf,
        #[arg(long)]
        prompt: Option<String>,
    },
    /// Describe a video file, with a transcript of any speech.
    DescribeVideo {
        file: PathBuf,
        #[arg(long)]
        prompt: Option<String>,
    },
    /// Generate images from a text prompt.
    Imagine {
        prompt: String,
        /// Number of images (1-4).
        #[arg(long, short = 'n')]
        count: Option<u32>,
        /// Directory the images are written to.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Answer a question grounded in Google Search results.
    Search { query: String },
    /// Print the effective configuration as JSON.
    Config,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_chat_default() {
        let args = Args::try_parse_from(["prism"]).unwrap();
        assert_eq!(args.command, None);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "prism",
            "search",
            "who won",
            "--log-level",
            "prism=debug",
        ])
        .unwrap();
        assert_eq!(args.log_level.as_deref(), Some("prism=debug"));
        assert_eq!(
            args.command,
            Some(Command::Search {
                query: "who won".into()
            })
        );
    }

    #[test]
    fn imagine_defaults() {
        let args = Args::try_parse_from(["prism", "imagine", "a lighthouse", "-n", "3"]).unwrap();
        assert_eq!(
            args.command,
            Some(Command::Imagine {
                prompt: "a lighthouse".into(),
                count: Some(3),
                out_dir: PathBuf::from("."),
            })
        );
    }

    #[test]
    fn chat_takes_system_instruction() {
        let args = Args::try_parse_from(["prism", "chat", "--system", "Be brief."]).unwrap();
        assert_eq!(
            args.command,
            Some(Command::Chat {
                system: Some("Be brief.".into())
            })
        );
    }
}
