//! CLI definitions for browse.

use std::path::PathBuf;

use browse_scrapers::sites::linkedin::SearchKind;
use browse_scrapers::sites::reddit::SortOrder;
use clap::{Parser, Subcommand};

/// Scrape pages from the browser you are already logged in to.
#[derive(Parser)]
#[command(name = "browse")]
#[command(about = "Scrape pages through a CDP relay attached to your own browser")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.browse/config.toml)
    #[arg(short, long, global = true, env = "BROWSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Tab to act on, as listed by `browse pages`
    #[arg(short, long, global = true)]
    pub tab: Option<usize>,

    /// Print single-line JSON
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// List open tabs
    Pages,

    /// Make a tab current and show it
    Switch {
        /// Tab index
        index: usize,
    },

    /// URL and title of the current tab
    Info,

    /// Navigate the current tab
    Navigate {
        /// Absolute URL
        url: String,
    },

    /// Capture a PNG screenshot
    Screenshot {
        /// Capture beyond the viewport
        #[arg(long)]
        full_page: bool,

        /// Write the PNG here instead of printing base64
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract text, links and images from the current tab
    Scrape {
        /// Limit extraction to the first element matching this CSS selector
        #[arg(short, long)]
        selector: Option<String>,
    },

    /// Run JavaScript in the current tab and print its result
    Exec {
        /// Function body; use `return` to produce a value
        script: String,
    },

    /// X / Twitter
    Twitter {
        #[command(subcommand)]
        action: TwitterAction,
    },

    /// LinkedIn
    Linkedin {
        #[command(subcommand)]
        action: LinkedinAction,
    },

    /// Reddit
    Reddit {
        #[command(subcommand)]
        action: RedditAction,
    },

    /// Instagram
    Instagram {
        #[command(subcommand)]
        action: InstagramAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum TwitterAction {
    /// Profile header of an account
    Profile {
        /// Handle, with or without @
        username: String,
    },

    /// Tweets from an account, or the home timeline
    Timeline {
        /// Handle; omit for the home timeline
        username: Option<String>,

        #[arg(short = 'n', long, default_value_t = 20)]
        count: usize,
    },

    /// A tweet with its thread and replies
    Post {
        /// Status URL on x.com or twitter.com
        url: String,
    },

    /// Latest tweets matching a query
    Search {
        query: String,

        #[arg(short = 'n', long, default_value_t = 20)]
        count: usize,
    },

    /// Tweets from a list
    List {
        /// Numeric list id
        list_id: String,

        #[arg(short = 'n', long, default_value_t = 20)]
        count: usize,
    },
}

#[derive(Subcommand)]
pub(crate) enum LinkedinAction {
    /// Profile with experience, education and skills
    Profile {
        /// Profile URL or public id
        profile: String,
    },

    /// Recent activity of a profile
    Posts {
        /// Profile URL or public id
        profile: String,

        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },

    /// People, companies or posts matching a query
    Search {
        query: String,

        /// people, companies or posts
        #[arg(short = 'k', long = "type", default_value = "people")]
        kind: SearchKind,

        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
}

#[derive(Subcommand)]
pub(crate) enum RedditAction {
    /// Karma, cake day and about text of a user
    User {
        /// Username, with or without u/
        username: String,
    },

    /// Posts from a subreddit
    Subreddit {
        /// Name, with or without r/
        name: String,

        #[arg(short = 'n', long, default_value_t = 25)]
        count: usize,

        /// hot, new or top
        #[arg(short, long, default_value = "hot")]
        sort: SortOrder,
    },

    /// A post with its comments
    Post {
        /// Post URL
        url: String,

        #[arg(short = 'm', long, default_value_t = 50)]
        max_comments: usize,
    },
}

#[derive(Subcommand)]
pub(crate) enum InstagramAction {
    /// Profile header of an account
    Profile {
        username: String,
    },

    /// Recent posts from the profile grid
    Posts {
        username: String,

        #[arg(short = 'n', long, default_value_t = 12)]
        count: usize,
    },

    /// Whether the account has an active story
    Stories {
        username: String,
    },
}
