mod cli;
mod error;

use crate::cli::{Cli, Command, NextArgs, TagAction};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use shuffler_codec::{Alignment, Scaling, TagSet, Weight};
use shuffler_config::Config;
use shuffler_library::{Filter, Key, Recategorized, Store, StoreOptions, TracingSink};
use shuffler_storage::backend::LocalBackend;
use std::path::Path;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(cli.log_level()).init();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        },
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let mut store = open(&config)?;
    let mut sink = TracingSink;
    match cli.command {
        Command::Next(args) => {
            let filter = filter(&config, &args)?;
            for _ in 0..args.count {
                let Some(key) = store.next(&filter, &mut sink).or_raise(|| ErrorKind::Library)? else {
                    break;
                };
                println!("{}", store.absolute(&key).display());
            }
        },
        Command::Rate { file, weight } => {
            let weight = argument::<Weight>(&weight, "weight")?;
            let mut key = key(&store, &file)?;
            let outcome = store.set_weight(&mut key, weight, &mut sink).or_raise(|| ErrorKind::Library)?;
            report(&store, &key, outcome);
        },
        Command::Tag { action } => {
            let (file, tag, add) = match action {
                TagAction::Add { file, tag } => (file, tag, true),
                TagAction::Remove { file, tag } => (file, tag, false),
            };
            let mut key = key(&store, &file)?;
            let outcome = match add {
                true => store.add_tag(&mut key, &tag, &mut sink),
                false => store.remove_tag(&mut key, &tag, &mut sink),
            }
            .or_raise(|| ErrorKind::Library)?;
            report(&store, &key, outcome);
        },
        Command::Tags => {
            for tag in store.available_tags().display_names() {
                println!("{tag}");
            }
        },
        Command::Info { file } => {
            let key = key(&store, &file)?;
            println!("path:      {}", store.absolute(&key).display());
            println!("name:      {}", store.name(&key));
            println!("weight:    {}", store.weight(&key));
            println!("tags:      {}", store.tags(&key));
            println!("scaling:   {}", store.scaling(&key).or_raise(|| ErrorKind::Library)?);
            println!("alignment: {}", store.alignment(&key).or_raise(|| ErrorKind::Library)?);
        },
        Command::Scaling { file, value } => {
            let key = key(&store, &file)?;
            match value {
                Some(value) => {
                    let scaling = argument::<Scaling>(&value, "scaling")?;
                    store.set_scaling(&key, scaling).or_raise(|| ErrorKind::Library)?;
                },
                None => println!("{}", store.scaling(&key).or_raise(|| ErrorKind::Library)?),
            }
        },
        Command::Align { file, value } => {
            let key = key(&store, &file)?;
            match value {
                Some(value) => {
                    let alignment = argument::<Alignment>(&value, "alignment")?;
                    store.set_alignment(&key, alignment).or_raise(|| ErrorKind::Library)?;
                },
                None => println!("{}", store.alignment(&key).or_raise(|| ErrorKind::Library)?),
            }
        },
        Command::Trash { file } => {
            let key = key(&store, &file)?;
            let trashed = store.trash(&key, &mut sink).or_raise(|| ErrorKind::Library)?;
            println!("{}", store.absolute(&trashed).display());
        },
        Command::Flip => store.flip(&mut sink).or_raise(|| ErrorKind::Library)?,
        Command::Rebuild => {
            store.rebuild(&mut sink).or_raise(|| ErrorKind::Library)?;
            let catalog = store.catalog();
            println!("{} images in {} categories", catalog.total_files(), catalog.directories().len());
        },
    }
    Ok(())
}

/// Configuration file and environment, with `--root` on top.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut figment = Config::figment(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if let Some(root) = &cli.root {
        let root = std::path::absolute(root).or_raise(|| ErrorKind::Config)?;
        figment = figment.merge(("root", root));
    }
    Config::from_figment(&figment).or_raise(|| ErrorKind::Config)
}

fn open(config: &Config) -> Result<Store> {
    let root = config.root().or_raise(|| ErrorKind::Config)?;
    let backend = LocalBackend::new(root).or_raise(|| ErrorKind::Open)?;
    let options = StoreOptions {
        max_attempts: config.max_attempts,
        recents_ceiling: config.recents_ceiling,
        prune_on_start: config.prune_on_start,
    };
    let mut store = Store::new(Arc::new(backend), options);
    store.post_init(&mut TracingSink).or_raise(|| ErrorKind::Open)?;
    Ok(store)
}

fn filter(config: &Config, args: &NextArgs) -> Result<Filter> {
    let mut tags = TagSet::new();
    for tag in config.tags.iter().chain(&args.tags) {
        tags.add(tag).or_raise(|| ErrorKind::Argument("tag"))?;
    }
    Ok(Filter {
        min_weight: args.min_weight.unwrap_or(config.min_weight),
        tags,
        include_not_shown: config.include_not_shown && !args.no_not_shown,
    })
}

/// Parse a command-line value with its codec.
fn argument<T>(value: &str, what: &'static str) -> Result<T>
where
    T: FromStr<Err = shuffler_codec::error::Error>,
{
    value.parse::<T>().or_raise(|| ErrorKind::Argument(what))
}

fn key(store: &Store, file: &Path) -> Result<Key> {
    // Relative arguments are taken relative to the working directory, like any other file argument.
    let file = std::path::absolute(file).or_raise(|| ErrorKind::Argument("file"))?;
    store.key(file).or_raise(|| ErrorKind::Library)
}

fn report(store: &Store, key: &Key, outcome: Recategorized) {
    match outcome {
        Recategorized::Moved(_) => println!("{}", store.absolute(key).display()),
        Recategorized::Unchanged => tracing::info!(file = %key, "Already in that category"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(tags: &[&str]) -> Config {
        Config {
            root: Some("/pictures".into()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Config::default()
        }
    }

    fn next_args(args: &[&str]) -> NextArgs {
        let cli = Cli::try_parse_from(["shuffler", "next"].iter().chain(args)).unwrap();
        match cli.command {
            Command::Next(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_filter_merges_config_and_arguments() {
        let filter = filter(&config(&["cats"]), &next_args(&["--tag", "Dogs", "--min-weight", "3"])).unwrap();
        assert_eq!(filter.min_weight, 3);
        assert_eq!(filter.tags.display_names(), vec!["Cats", "Dogs"]);
        assert!(filter.include_not_shown);
    }

    #[test]
    fn test_filter_defaults_from_config() {
        let config = Config { min_weight: 2, include_not_shown: true, ..config(&[]) };
        let filter = filter(&config, &next_args(&["--no-not-shown"])).unwrap();
        assert_eq!(filter.min_weight, 2);
        assert!(filter.tags.is_empty());
        assert!(!filter.include_not_shown);
    }

    #[test]
    fn test_arguments() {
        assert_eq!(argument::<Weight>("3", "weight").unwrap(), Weight::weighted(3).unwrap());
        assert_eq!(argument::<Weight>("not-shown", "weight").unwrap(), Weight::NotShown);
        assert_eq!(argument::<Scaling>("-1", "scaling").unwrap(), Scaling::Fit);
        assert_eq!(argument::<Alignment>("Bottom", "alignment").unwrap(), Alignment::Bottom);
        let err = argument::<Weight>("0", "weight").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Argument("weight")));
        assert!(argument::<Scaling>("wide", "scaling").is_err());
    }

    #[test]
    fn test_filter_rejects_bad_tag() {
        let err = filter(&config(&[]), &next_args(&["--tag", "a-b"])).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Argument("tag")));
    }
}
