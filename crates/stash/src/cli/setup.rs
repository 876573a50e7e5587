use clap::{Args, Parser, Subcommand};
use stashapp::model::{MediaStatus, MediaType, UserRole};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "stash",
    bin_name = "stash",
    version,
    disable_help_subcommand = true,
    after_help = "Every invocation starts from the seed data. Use `stash shell` to run\nseveral commands against the same store."
)]
#[command(about = "In-memory media library backend, driven from the terminal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Print full JSON envelopes instead of formatted output
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,

    /// Read configuration from this TOML file
    #[arg(long, global = true, value_name = "PATH", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Enable simulated latency and outages
    #[arg(long, global = true, help_heading = "Options")]
    pub faults: bool,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

/// One line of `stash shell` input: a command without the program name.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_subcommand = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Print this command's result as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse and edit media items
    #[command(subcommand, display_order = 1)]
    Media(MediaCommands),

    /// Manage the folder hierarchy
    #[command(subcommand, display_order = 2)]
    Folders(FolderCommands),

    /// Manage collections, their items and sharing
    #[command(subcommand, display_order = 3)]
    Collections(CollectionCommands),

    /// Manage tags and tag media in bulk
    #[command(subcommand, display_order = 4)]
    Tags(TagCommands),

    /// Manage tag categories
    #[command(subcommand, display_order = 5)]
    Categories(CategoryCommands),

    /// Inspect and edit users
    #[command(subcommand, display_order = 6)]
    Users(UserCommands),

    /// Log in with the configured credentials
    #[command(display_order = 20)]
    Login { email: String, password: String },

    /// Row counts per table
    #[command(display_order = 21)]
    Stats,

    /// Discard changes and reload the seed data
    #[command(display_order = 22)]
    Reset,

    /// Show the effective configuration
    #[command(subcommand, display_order = 23)]
    Config(ConfigCommands),

    /// Read commands from stdin, one per line, against a single store
    #[command(display_order = 24)]
    Shell,
}

/// Query options shared by every `list` command.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Free-text search over the searchable fields
    #[arg(short, long)]
    pub search: Option<String>,

    /// Field criterion, `name=value` (repeatable; comma lists match any)
    #[arg(short = 'w', long = "where", value_name = "NAME=VALUE")]
    pub criteria: Vec<String>,

    /// Sort field
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Items per page (defaults to the configured size)
    #[arg(long)]
    pub page_size: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum MediaCommands {
    /// List media items
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only items in this folder and its subfolders
        #[arg(long)]
        folder: Option<String>,

        /// With --folder, skip subfolders
        #[arg(long, requires = "folder")]
        direct: bool,
    },

    /// Show one media item
    Show { id: String },

    /// Create a media item
    Create {
        name: String,

        #[arg(long)]
        folder: String,

        #[arg(long = "type", default_value = "image")]
        media_type: MediaType,

        /// Tag name (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        status: Option<MediaStatus>,

        /// Size in bytes
        #[arg(long)]
        size: Option<u64>,
    },

    /// Update one or more media items
    Update {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        folder: Option<String>,

        #[arg(long = "type")]
        media_type: Option<MediaType>,

        #[arg(long)]
        status: Option<MediaStatus>,

        /// Replace the tag list (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Remove every tag
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,
    },

    /// Delete one or more media items
    #[command(alias = "rm")]
    Delete {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },

    /// Toggle the star flag
    Star { id: String },

    /// Toggle the favorite flag
    Favorite { id: String },

    /// Collections referencing an item
    Usage { id: String },
}

#[derive(Subcommand, Debug)]
pub enum FolderCommands {
    /// List folders
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Print the folder hierarchy
    Tree,

    /// Show a folder with its breadcrumbs and media count
    Show { id: String },

    /// Create a folder
    Create {
        name: String,

        #[arg(long)]
        parent: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },

    /// Rename, move or recolor a folder
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, conflicts_with = "root")]
        parent: Option<String>,

        /// Move the folder to the top level
        #[arg(long)]
        root: bool,

        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a folder
    #[command(alias = "rm")]
    Delete {
        id: String,

        /// Also delete subfolders and move media to the parent folder
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CollectionCommands {
    /// List collections
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only collections created by or shared with this user
        #[arg(long)]
        user: Option<String>,
    },

    /// Print the collection hierarchy
    Tree,

    /// Show one collection
    Show { id: String },

    /// Create a collection
    Create {
        name: String,

        /// Creating user id (defaults to the configured login user)
        #[arg(long)]
        owner: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        parent: Option<String>,
    },

    /// Edit a collection
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long, conflicts_with = "root")]
        parent: Option<String>,

        /// Move the collection to the top level
        #[arg(long)]
        root: bool,
    },

    /// Delete a collection
    #[command(alias = "rm")]
    Delete { id: String },

    /// Add media items
    Add {
        id: String,
        #[arg(required = true, num_args = 1..)]
        media: Vec<String>,
    },

    /// Remove media items
    Remove {
        id: String,
        #[arg(required = true, num_args = 1..)]
        media: Vec<String>,
    },

    /// Share with users
    Share {
        id: String,
        #[arg(required = true, num_args = 1..)]
        users: Vec<String>,
    },

    /// Stop sharing with users
    Unshare {
        id: String,
        #[arg(required = true, num_args = 1..)]
        users: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TagCommands {
    /// List tags
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Show a tag (by id or name)
    Show { tag: String },

    /// Create a tag
    Create {
        name: String,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        category: Option<String>,
    },

    /// Edit a tag
    Update {
        tag: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long, conflicts_with = "no_category")]
        category: Option<String>,

        /// Detach the tag from its category
        #[arg(long)]
        no_category: bool,
    },

    /// Rename a tag everywhere it is used
    Rename { tag: String, new_name: String },

    /// Delete a tag and strip it from media
    #[command(alias = "rm")]
    Delete { tag: String },

    /// Add and remove tags on many media items
    Apply {
        #[arg(required = true, num_args = 1..)]
        media: Vec<String>,

        #[arg(long = "add")]
        add: Vec<String>,

        #[arg(long = "remove")]
        remove: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List categories
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Show a category and its tags
    Show { id: String },

    /// Create a category
    Create {
        name: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Edit a category
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a category
    #[command(alias = "rm")]
    Delete {
        id: String,

        /// Detach its tags instead of refusing
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List users
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Show one user
    Show { id: String },

    /// Edit a user
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        role: Option<UserRole>,
    },

    /// Merge a JSON object into the user's preferences
    Prefs { id: String, json: String },

    /// Show recent folders and files, optionally recording a visit first
    Recent {
        id: String,

        #[arg(long)]
        folder: Option<String>,

        #[arg(long)]
        file: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML-like key/value pairs
    Show,

    /// Print a commented `stash.toml` template
    Template,

    /// Print the global config file location
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
        ShellLine::command().debug_assert();
    }

    #[test]
    fn parses_list_criteria() {
        let cli = Cli::parse_from([
            "stash", "media", "list", "-w", "starred=true", "--sort", "name", "--desc",
            "--folder", "fld-1", "--direct",
        ]);
        match cli.command {
            Commands::Media(MediaCommands::List { list, folder, direct }) => {
                assert_eq!(list.criteria, vec!["starred=true"]);
                assert!(list.desc);
                assert_eq!(folder.as_deref(), Some("fld-1"));
                assert!(direct);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_media_type_case_insensitively() {
        let cli = Cli::parse_from(["stash", "media", "create", "a.mp4", "--folder", "f", "--type", "VIDEO"]);
        match cli.command {
            Commands::Media(MediaCommands::Create { media_type, .. }) => {
                assert_eq!(media_type, MediaType::Video)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(Cli::try_parse_from(["stash", "media", "update", "m1", "--status", "lost"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::parse_from(["stash", "stats", "--json", "--faults"]);
        assert!(cli.global.json);
        assert!(cli.global.faults);
    }

    #[test]
    fn shell_lines_have_no_binary_name() {
        let line = ShellLine::try_parse_from(["tags", "rename", "beach", "shore"]).unwrap();
        assert!(matches!(line.command, Commands::Tags(TagCommands::Rename { .. })));
    }
}
