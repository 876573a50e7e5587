//! # CLI Layer
//!
//! One client of the stash backend. This is the only place that knows about
//! stdin, stdout and stderr, parses arguments, or decides how results look.
//!
//! ## Flow
//!
//! 1. Parse arguments with clap (`setup.rs`).
//! 2. Install the tracing subscriber (`STASH_LOG`, or `-v` for debug).
//! 3. Build a [`StashContext`] from the layered configuration and the seed.
//! 4. Dispatch to the matching [`StashApi`] call and hand the envelope to
//!    [`emit`], which prints either the rendered view or the raw JSON.
//!
//! Every process starts from the seed, so `stash shell` exists to run many
//! commands against one store: it reads stdin line by line and keeps going
//! after a failed command.
//!
//! Failures travel as [`ApiError`] inside `anyhow::Error`, so `main` can
//! print the error code.

use super::render;
use super::setup::{
    CategoryCommands, Cli, CollectionCommands, Commands, ConfigCommands, FolderCommands,
    GlobalArgs, ListArgs, MediaCommands, ShellLine, TagCommands, UserCommands,
};
use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use stashapp::api::{ApiResult, StashApi};
use stashapp::attributes::{parse_criterion, split_criterion};
use stashapp::commands::collections::{CollectionUpdate, NewCollection};
use stashapp::commands::categories::CategoryUpdate;
use stashapp::commands::folders::{FolderUpdate, NewFolder};
use stashapp::commands::media::{FolderScope, MediaUpdate, NewMedia};
use stashapp::commands::tags::{NewTag, TagUpdate};
use stashapp::commands::users::UserUpdate;
use stashapp::config::{global_config_path, StashConfig};
use stashapp::envelope::{new_request_id, ApiError};
use stashapp::error::StashError;
use stashapp::init::{initialize, InitOptions};
use stashapp::model::{
    Collection, Folder, MediaItem, Record, Tag, TagCategory, User,
};
use stashapp::query::{Page, Query, SortSpec};
use stashapp::store::memory::MemoryStore;
use std::io::BufRead;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

struct AppContext {
    api: StashApi<MemoryStore>,
    json: bool,
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    // These two never touch the store.
    match &cli.command {
        Commands::Config(ConfigCommands::Template) => {
            print!("{}", StashConfig::template());
            return Ok(());
        }
        Commands::Config(ConfigCommands::Path) => {
            match global_config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("(no config directory on this platform)"),
            }
            return Ok(());
        }
        _ => {}
    }

    let mut ctx = init_context(&cli.global)?;
    match cli.command {
        Commands::Shell => handle_shell(&mut ctx),
        command => dispatch(&mut ctx, command),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("STASH_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn init_context(global: &GlobalArgs) -> anyhow::Result<AppContext> {
    let context = initialize(InitOptions {
        config_path: global.config.as_deref(),
        force_faults: global.faults,
    })
    .map_err(api_error)?;
    Ok(AppContext {
        api: context.api,
        json: global.json,
    })
}

fn api_error(err: StashError) -> anyhow::Error {
    ApiError::from_error(&err, new_request_id()).into()
}

/// Prints a result envelope; `view` renders the payload for humans.
fn emit<T: Serialize>(
    ctx: &AppContext,
    result: ApiResult<T>,
    view: impl FnOnce(&T) -> String,
) -> anyhow::Result<()> {
    match result {
        Ok(envelope) => {
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&envelope)?);
            } else {
                print!("{}", view(&envelope.data));
                if let Some(line) = render::message(&envelope.message) {
                    println!("{}", line);
                }
            }
            Ok(())
        }
        Err(err) => {
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&err)?);
            }
            Err(err.into())
        }
    }
}

fn paged<T>(page: &Page<T>, table: impl FnOnce(&[T]) -> String) -> String {
    let mut out = table(&page.items);
    if !page.items.is_empty() || page.meta.total > 0 {
        out.push_str(&render::page_footer(&page.meta));
        out.push('\n');
    }
    out
}

/// Builds a query for `R` from list options, validating criteria names.
fn build_query<R: Record>(api: &StashApi<MemoryStore>, list: &ListArgs) -> anyhow::Result<Query> {
    let mut query = api.query();
    for raw in &list.criteria {
        let (name, value) = split_criterion(raw).map_err(api_error)?;
        query = query.filter(parse_criterion(R::ATTRIBUTES, &name, &value).map_err(api_error)?);
    }
    if let Some(term) = &list.search {
        query = query.search(term.clone());
    }
    if let Some(field) = &list.sort {
        let spec = if list.desc {
            SortSpec::desc(field.clone())
        } else {
            SortSpec::asc(field.clone())
        };
        query = query.sort(spec);
    }
    let page_size = list.page_size.unwrap_or(query.page_size);
    Ok(query.page(list.page, page_size))
}

fn dispatch(ctx: &mut AppContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Media(cmd) => handle_media(ctx, cmd),
        Commands::Folders(cmd) => handle_folders(ctx, cmd),
        Commands::Collections(cmd) => handle_collections(ctx, cmd),
        Commands::Tags(cmd) => handle_tags(ctx, cmd),
        Commands::Categories(cmd) => handle_categories(ctx, cmd),
        Commands::Users(cmd) => handle_users(ctx, cmd),
        Commands::Login { email, password } => {
            let result = ctx.api.login(&email, &password);
            emit(ctx, result, render::session)
        }
        Commands::Stats => {
            let result = ctx.api.stats();
            emit(ctx, result, render::stats)
        }
        Commands::Reset => {
            let result = ctx.api.reset();
            emit(ctx, result, render::stats)
        }
        Commands::Config(cmd) => handle_config(ctx, cmd),
        Commands::Shell => Err(anyhow::anyhow!("shell cannot be nested")),
    }
}

fn handle_media(ctx: &mut AppContext, cmd: MediaCommands) -> anyhow::Result<()> {
    let now = Utc::now();
    match cmd {
        MediaCommands::List {
            list,
            folder,
            direct,
        } => {
            let query = build_query::<MediaItem>(&ctx.api, &list)?;
            let scope = folder.map(|id| {
                if direct {
                    FolderScope::direct(id)
                } else {
                    FolderScope::recursive(id)
                }
            });
            let result = ctx.api.list_media(&query, scope.as_ref());
            emit(ctx, result, |page| paged(page, |items| render::media_table(items, now)))
        }
        MediaCommands::Show { id } => {
            let result = ctx.api.get_media(&id);
            emit(ctx, result, |m| render::media_detail(m, now))
        }
        MediaCommands::Usage { id } => {
            let result = ctx.api.media_usage(&id);
            emit(ctx, result, |cols| render::usage(&id, cols))
        }
        MediaCommands::Create {
            name,
            folder,
            media_type,
            tags,
            status,
            size,
        } => {
            let mut input = NewMedia::new(name, media_type, folder);
            input.tags = tags;
            if let Some(status) = status {
                input.status = status;
            }
            if let Some(size) = size {
                input.size = size;
            }
            let result = ctx.api.create_media(input);
            emit(ctx, result, |m| render::media_detail(m, now))
        }
        MediaCommands::Update {
            ids,
            name,
            folder,
            media_type,
            status,
            tags,
            clear_tags,
        } => {
            let tags = if clear_tags {
                Some(Vec::new())
            } else if tags.is_empty() {
                None
            } else {
                Some(tags)
            };
            let update = MediaUpdate {
                name,
                media_type,
                folder,
                tags,
                status,
                ..Default::default()
            };
            if let [id] = ids.as_slice() {
                let result = ctx.api.update_media(id, update);
                emit(ctx, result, |m| render::media_detail(m, now))
            } else {
                let result = ctx.api.batch_update_media(&ids, &update);
                emit(ctx, result, render::batch_outcome)
            }
        }
        MediaCommands::Delete { ids } => {
            if let [id] = ids.as_slice() {
                let result = ctx.api.delete_media(id);
                emit(ctx, result, |_| String::new())
            } else {
                let result = ctx.api.batch_delete_media(&ids);
                emit(ctx, result, render::batch_outcome)
            }
        }
        MediaCommands::Star { id } => {
            let result = ctx.api.toggle_starred(&id);
            emit(ctx, result, |_| String::new())
        }
        MediaCommands::Favorite { id } => {
            let result = ctx.api.toggle_favorited(&id);
            emit(ctx, result, |_| String::new())
        }
    }
}

fn handle_folders(ctx: &mut AppContext, cmd: FolderCommands) -> anyhow::Result<()> {
    match cmd {
        FolderCommands::List { list } => {
            let query = build_query::<Folder>(&ctx.api, &list)?;
            let result = ctx.api.list_folders(&query);
            emit(ctx, result, |page| paged(page, render::folder_table))
        }
        FolderCommands::Tree => {
            let result = ctx.api.folder_tree();
            emit(ctx, result, |forest| render::tree(forest, &render::folder_label))
        }
        FolderCommands::Show { id } => {
            let result = ctx.api.get_folder(&id);
            if ctx.json || result.is_err() {
                return emit(ctx, result, |_| String::new());
            }
            let crumbs = ctx.api.folder_breadcrumbs(&id).map_err(anyhow::Error::from)?.data;
            let direct = ctx.api.folder_media_count(&id, false).map_err(anyhow::Error::from)?.data;
            let total = ctx.api.folder_media_count(&id, true).map_err(anyhow::Error::from)?.data;
            emit(ctx, result, |f| render::folder_detail(f, &crumbs, direct, total))
        }
        FolderCommands::Create {
            name,
            parent,
            color,
        } => {
            let result = ctx.api.create_folder(NewFolder {
                name,
                parent,
                color,
            });
            emit(ctx, result, |f| format!("{}\n", f.path))
        }
        FolderCommands::Update {
            id,
            name,
            parent,
            root,
            color,
        } => {
            let parent = if root { Some(None) } else { parent.map(Some) };
            let result = ctx.api.update_folder(
                &id,
                FolderUpdate {
                    name,
                    parent,
                    color: color.map(Some),
                },
            );
            emit(ctx, result, |f| format!("{}\n", f.path))
        }
        FolderCommands::Delete { id, force } => {
            let result = ctx.api.delete_folder(&id, force);
            emit(ctx, result, render::folder_deletion)
        }
    }
}

fn handle_collections(ctx: &mut AppContext, cmd: CollectionCommands) -> anyhow::Result<()> {
    match cmd {
        CollectionCommands::List { list, user } => {
            let query = build_query::<Collection>(&ctx.api, &list)?;
            let result = match user {
                Some(user) => ctx.api.collections_for_user(&user, &query),
                None => ctx.api.list_collections(&query),
            };
            emit(ctx, result, |page| paged(page, render::collection_table))
        }
        CollectionCommands::Tree => {
            let result = ctx.api.collection_tree();
            emit(ctx, result, |forest| render::tree(forest, &render::collection_label))
        }
        CollectionCommands::Show { id } => {
            let result = ctx.api.get_collection(&id);
            emit(ctx, result, render::collection_detail)
        }
        CollectionCommands::Create {
            name,
            owner,
            description,
            color,
            parent,
        } => {
            let result = ctx.api.create_collection(NewCollection {
                name,
                description,
                color,
                created_by: owner.unwrap_or_default(),
                parent_id: parent,
            });
            emit(ctx, result, render::collection_detail)
        }
        CollectionCommands::Update {
            id,
            name,
            description,
            color,
            parent,
            root,
        } => {
            let parent_id = if root { Some(None) } else { parent.map(Some) };
            let result = ctx.api.update_collection(
                &id,
                CollectionUpdate {
                    name,
                    description: description.map(Some),
                    color,
                    parent_id,
                },
            );
            emit(ctx, result, render::collection_detail)
        }
        CollectionCommands::Delete { id } => {
            let result = ctx.api.delete_collection(&id);
            emit(ctx, result, |_| String::new())
        }
        CollectionCommands::Add { id, media } => {
            let result = ctx.api.add_to_collection(&id, &media);
            emit(ctx, result, render::collection_detail)
        }
        CollectionCommands::Remove { id, media } => {
            let result = ctx.api.remove_from_collection(&id, &media);
            emit(ctx, result, render::collection_detail)
        }
        CollectionCommands::Share { id, users } => {
            let result = ctx.api.share_collection(&id, &users);
            emit(ctx, result, render::collection_detail)
        }
        CollectionCommands::Unshare { id, users } => {
            let result = ctx.api.unshare_collection(&id, &users);
            emit(ctx, result, render::collection_detail)
        }
    }
}

fn handle_tags(ctx: &mut AppContext, cmd: TagCommands) -> anyhow::Result<()> {
    match cmd {
        TagCommands::List { list } => {
            let query = build_query::<Tag>(&ctx.api, &list)?;
            let result = ctx.api.list_tags(&query);
            emit(ctx, result, |page| paged(page, render::tag_table))
        }
        TagCommands::Show { tag } => {
            let result = ctx.api.get_tag(&tag);
            emit(ctx, result, render::tag_detail)
        }
        TagCommands::Create {
            name,
            color,
            category,
        } => {
            let result = ctx.api.create_tag(NewTag {
                name,
                color,
                category_id: category,
            });
            emit(ctx, result, render::tag_detail)
        }
        TagCommands::Update {
            tag,
            name,
            color,
            category,
            no_category,
        } => {
            let category_id = if no_category {
                Some(None)
            } else {
                category.map(Some)
            };
            let result = ctx.api.update_tag(
                &tag,
                TagUpdate {
                    name,
                    color: color.map(Some),
                    category_id,
                },
            );
            emit(ctx, result, render::tag_detail)
        }
        TagCommands::Rename { tag, new_name } => {
            let result = ctx.api.rename_tag(&tag, &new_name);
            emit(ctx, result, |_| String::new())
        }
        TagCommands::Delete { tag } => {
            let result = ctx.api.delete_tag(&tag);
            emit(ctx, result, render::tag_deletion)
        }
        TagCommands::Apply { media, add, remove } => {
            let result = ctx.api.apply_tags(&media, &add, &remove);
            emit(ctx, result, render::tagging_outcome)
        }
    }
}

fn handle_categories(ctx: &mut AppContext, cmd: CategoryCommands) -> anyhow::Result<()> {
    match cmd {
        CategoryCommands::List { list } => {
            let query = build_query::<TagCategory>(&ctx.api, &list)?;
            let result = ctx.api.list_categories(&query);
            emit(ctx, result, |page| paged(page, render::category_table))
        }
        CategoryCommands::Show { id } => {
            let result = ctx.api.get_category(&id);
            if ctx.json || result.is_err() {
                return emit(ctx, result, |_| String::new());
            }
            let tags = ctx.api.category_tags(&id).map_err(anyhow::Error::from)?.data;
            emit(ctx, result, |c| {
                format!(
                    "{}{}",
                    render::category_table(std::slice::from_ref(c)),
                    render::tag_table(&tags)
                )
            })
        }
        CategoryCommands::Create { name, description } => {
            let result = ctx.api.create_category(&name, description);
            emit(ctx, result, |c| render::category_table(std::slice::from_ref(c)))
        }
        CategoryCommands::Update {
            id,
            name,
            description,
        } => {
            let result = ctx.api.update_category(
                &id,
                CategoryUpdate {
                    name,
                    description: description.map(Some),
                },
            );
            emit(ctx, result, |c| render::category_table(std::slice::from_ref(c)))
        }
        CategoryCommands::Delete { id, force } => {
            let result = ctx.api.delete_category(&id, force);
            emit(ctx, result, |_| String::new())
        }
    }
}

fn handle_users(ctx: &mut AppContext, cmd: UserCommands) -> anyhow::Result<()> {
    match cmd {
        UserCommands::List { list } => {
            let query = build_query::<User>(&ctx.api, &list)?;
            let result = ctx.api.list_users(&query);
            emit(ctx, result, |page| paged(page, render::user_table))
        }
        UserCommands::Show { id } => {
            let result = ctx.api.get_user(&id);
            emit(ctx, result, render::user_detail)
        }
        UserCommands::Update {
            id,
            name,
            email,
            role,
        } => {
            let result = ctx.api.update_user(&id, UserUpdate { name, email, role });
            emit(ctx, result, render::user_detail)
        }
        UserCommands::Prefs { id, json } => {
            let patch: serde_json::Value =
                serde_json::from_str(&json).context("preferences must be a JSON object")?;
            let result = ctx.api.update_preferences(&id, &patch);
            emit(ctx, result, |prefs| {
                format!("{}\n", serde_json::Value::Object(prefs.clone()))
            })
        }
        UserCommands::Recent { id, folder, file } => {
            if let Some(folder) = folder {
                ctx.api
                    .record_recent_folder(&id, &folder)
                    .map_err(anyhow::Error::from)?;
            }
            if let Some(file) = file {
                ctx.api
                    .record_recent_file(&id, &file)
                    .map_err(anyhow::Error::from)?;
            }
            let result = ctx.api.recent(&id);
            emit(ctx, result, render::recent)
        }
    }
}

fn handle_config(ctx: &AppContext, cmd: ConfigCommands) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let value = serde_json::to_value(ctx.api.config())?;
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                print!("{}", config_lines(&value));
            }
            Ok(())
        }
        ConfigCommands::Template => {
            print!("{}", StashConfig::template());
            Ok(())
        }
        ConfigCommands::Path => {
            if let Some(path) = global_config_path() {
                println!("{}", path.display());
            }
            Ok(())
        }
    }
}

/// Flattens the config into `section.key = value` lines.
fn config_lines(value: &serde_json::Value) -> String {
    let mut out = String::new();
    if let serde_json::Value::Object(sections) = value {
        for (section, fields) in sections {
            if let serde_json::Value::Object(fields) = fields {
                for (key, v) in fields {
                    out.push_str(&format!("{}.{} = {}\n", section, key, v));
                }
            }
        }
    }
    out
}

fn handle_shell(ctx: &mut AppContext) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let default_json = ctx.json;
    for line in stdin.lock().lines() {
        let line = line?;
        let words = split_line(&line);
        if words.is_empty() || words[0].starts_with('#') {
            continue;
        }
        if matches!(words[0].as_str(), "exit" | "quit") {
            break;
        }

        let parsed = match ShellLine::try_parse_from(&words) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("{}", e.render().to_string().trim_end());
                continue;
            }
        };
        ctx.json = default_json || parsed.json;
        if let Err(e) = dispatch(ctx, parsed.command) {
            eprintln!("{}", describe_error(&e));
        }
    }
    ctx.json = default_json;
    Ok(())
}

pub fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(api) => render::error(api),
        None => format!("Error: {:#}", err),
    }
}

/// Splits a shell line on whitespace, honoring single and double quotes.
fn split_line(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_word = false;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use stashapp::init::with_config;
    use stashapp::store::Seed;

    fn ctx() -> AppContext {
        let context = with_config(StashConfig::default(), &Seed::builtin().unwrap()).unwrap();
        AppContext {
            api: context.api,
            json: false,
        }
    }

    #[test]
    fn split_line_honors_quotes() {
        assert_eq!(
            split_line(r#"folders create "Summer 2025" --parent 'fld 1'"#),
            vec!["folders", "create", "Summer 2025", "--parent", "fld 1"]
        );
        assert_eq!(split_line("  stats  "), vec!["stats"]);
        assert_eq!(split_line(r#"tags create """#), vec!["tags", "create", ""]);
    }

    #[test]
    fn build_query_applies_list_options() {
        let ctx = ctx();
        let list = ListArgs {
            search: Some("hero".into()),
            criteria: vec!["starred=true".into()],
            sort: Some("name".into()),
            desc: true,
            page: 2,
            page_size: Some(5),
        };
        let query = build_query::<MediaItem>(&ctx.api, &list).unwrap();
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.search.as_deref(), Some("hero"));
        assert_eq!(query.sort, Some(SortSpec::desc("name")));
        assert_eq!((query.page, query.page_size), (2, 5));
    }

    #[test]
    fn build_query_rejects_unknown_criteria() {
        let ctx = ctx();
        let list = ListArgs {
            criteria: vec!["colour=red".into()],
            page: 1,
            ..Default::default()
        };
        let err = build_query::<MediaItem>(&ctx.api, &list).unwrap_err();
        assert!(err.downcast_ref::<ApiError>().is_some());
    }

    #[test]
    fn nested_shell_is_refused() {
        let mut ctx = ctx();
        assert!(dispatch(&mut ctx, Commands::Shell).is_err());
    }

    #[test]
    fn config_lines_flatten_sections() {
        let value = serde_json::json!({"query": {"max_page_size": 100}});
        assert_eq!(config_lines(&value), "query.max_page_size = 100\n");
    }
}
