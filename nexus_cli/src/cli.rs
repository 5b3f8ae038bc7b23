use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nexus")]
#[command(about = "Nexus - search many sources at once, with AI summaries and a blog")]
#[command(version)]
#[command(after_help = "\x1b[1;36mQuick Start:\x1b[0m
  nexus search \"rust ownership\"           Search every source
  nexus search \"rust\" -k news -k videos   Search selected kinds only
  nexus history                           Your recent searches (needs a token)
  nexus explain \"borrow checker\"          Plain-language explanation
  nexus generate \"Write a haiku\"          Raw text generation

\x1b[1;36mBlog:\x1b[0m
  nexus users signup you@example.com      Create an account
  nexus users signin you@example.com      Get a session token
  nexus blogs list                        Published posts
  nexus blogs create --title .. --content ..

\x1b[1;36mConfiguration:\x1b[0m
  nexus config show                       Effective configuration (secrets hidden)
  nexus config path                       Where the config file lives")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true, env = "NEXUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search every configured source and summarize the results
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  nexus search \"technology\"
  nexus search \"jazz\" -k music -k videos
  nexus search \"rust\" --output json

\x1b[1;33mKinds:\x1b[0m
  synthesized, encyclopedia, web, dictionary, news, images, videos, music, blogs")]
    Search {
        /// Free-text query
        query: String,
        /// Restrict to these kinds (repeatable; default is everything)
        #[arg(short, long = "kind")]
        kinds: Vec<String>,
        /// Session token; the search is saved to your history
        #[arg(long, env = "NEXUS_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Your most recent searches, newest first
    History {
        #[arg(short, long, default_value_t = 10)]
        limit: i64,
        #[arg(long, env = "NEXUS_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Explain a term in plain language
    Explain {
        /// The term to explain
        term: String,
    },

    /// Send a prompt straight to the text-generation model
    Generate {
        /// Prompt text
        prompt: String,
        /// Sampling temperature
        #[arg(long, default_value_t = 0.3)]
        temperature: f32,
        /// Maximum tokens in the reply
        #[arg(long, default_value_t = 768)]
        max_output_tokens: u32,
    },

    /// Read and write blog posts
    Blogs {
        #[command(subcommand)]
        action: BlogsAction,
    },

    /// Accounts and sessions
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Clone)]
pub enum BlogsAction {
    /// List published posts
    List {
        /// Featured posts only
        #[arg(long)]
        featured: bool,
        /// Match title, excerpt or content
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long, default_value_t = 12)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
    /// List your own posts
    Mine {
        /// all, published or drafts
        #[arg(long, default_value = "all")]
        status: String,
        #[arg(long, env = "NEXUS_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// Show a published post by slug (counts as a view)
    Get { slug: String },
    /// Write a new post
    Create {
        #[arg(long)]
        title: String,
        /// Post body; use --content-file to read it from disk
        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,
        #[arg(long)]
        content_file: Option<PathBuf>,
        #[arg(long)]
        excerpt: Option<String>,
        #[arg(long)]
        slug: Option<String>,
        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        cover_image_url: Option<String>,
        /// Publish immediately instead of saving a draft
        #[arg(long)]
        publish: bool,
        #[arg(long, env = "NEXUS_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// Change fields of one of your posts
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        excerpt: Option<String>,
        #[arg(long)]
        slug: Option<String>,
        /// Replace tags (repeatable)
        #[arg(long = "tag")]
        tags: Option<Vec<String>>,
        #[arg(long)]
        cover_image_url: Option<String>,
        #[arg(long)]
        published: Option<bool>,
        #[arg(long)]
        featured: Option<bool>,
        #[arg(long, env = "NEXUS_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// Delete one of your posts
    Delete {
        id: String,
        #[arg(long, env = "NEXUS_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
pub enum UsersAction {
    /// Create an account and print a session token
    Signup {
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        username: Option<String>,
    },
    /// Sign in and print a session token
    Signin {
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Show the account a token belongs to
    Me {
        #[arg(long, env = "NEXUS_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Show the effective configuration with secrets redacted
    Show,
    /// Print the config file path
    Path,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Pretty,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Plain text output
    Text,
}
