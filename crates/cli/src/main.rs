use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::InteractionRepository;
use latent::{StopSignal, Trainer, TrainingReport};
use recommender::{
    RecommendError, RecommendOutcome, RecommendationFacade, RecommenderConfig, Strategy,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Book-Recs - Book Recommendation Engine
#[derive(Parser)]
#[command(name = "book-recs")]
#[command(about = "Book recommendations from title similarity, similar readers and a latent-factor model", long_about = None)]
struct Cli {
    /// Path to the Book-Crossing dataset directory (Ratings.csv, Books.csv)
    #[arg(short, long, default_value = "data/book-crossing")]
    data_dir: PathBuf,

    /// JSON file overriding engine settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print results as JSON instead of colored text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get book recommendations with one strategy
    Recommend {
        /// content, neighborhood or latent
        #[arg(long, default_value = "neighborhood")]
        strategy: Strategy,

        /// Item id (ISBN) for content, user id otherwise
        #[arg(long)]
        subject: String,

        /// Number of recommendations to return
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Find books whose titles read like the given one
    Similar {
        /// Exact book title
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Train the latent-factor model and print its learning curve
    Train,

    /// Show dataset statistics
    Stats,

    /// Show the books a user has rated
    User {
        #[arg(long)]
        user_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RecommenderConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RecommenderConfig::default(),
    };

    let repo = load_repository(&cli.data_dir, &config).await?;

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            strategy,
            subject,
            limit,
        } => handle_recommend(repo, &config, strategy, &subject, limit, cli.json).await?,
        Commands::Similar { title, limit } => {
            handle_similar(repo, &config, &title, limit, cli.json).await?
        }
        Commands::Train => handle_train(repo, &config, cli.json).await?,
        Commands::Stats => handle_stats(&repo, cli.json)?,
        Commands::User { user_id } => handle_user(&repo, &user_id, cli.json)?,
    }

    Ok(())
}

async fn load_repository(
    data_dir: &Path,
    config: &RecommenderConfig,
) -> Result<Arc<InteractionRepository>> {
    println!("Loading Book-Crossing dataset from {}...", data_dir.display());
    let start = Instant::now();

    let dir = data_dir.to_path_buf();
    let cleaning = config.cleaning.clone();
    let repo = tokio::task::spawn_blocking(move || {
        InteractionRepository::load_from_dir(&dir, &cleaning)
    })
    .await
    .context("Dataset loading task failed")?
    .context("Failed to load Book-Crossing dataset")?;

    println!("{} Loaded dataset in {:?}", "✓".green(), start.elapsed());
    Ok(Arc::new(repo))
}

/// Raise `stop` on the first Ctrl-C
fn stop_on_ctrl_c(stop: StopSignal) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Stopping after the current epoch...".yellow());
            stop.stop();
        }
    });
}

async fn build_facade(
    repo: Arc<InteractionRepository>,
    config: &RecommenderConfig,
) -> Result<RecommendationFacade> {
    let stop = StopSignal::new();
    stop_on_ctrl_c(stop.clone());

    let start = Instant::now();
    let facade = RecommendationFacade::build(repo, config, stop)
        .await
        .context("Failed to build recommendation engines")?;
    info!("Engines ready in {:.2?}", start.elapsed());
    Ok(facade)
}

/// Handle the 'recommend' command
async fn handle_recommend(
    repo: Arc<InteractionRepository>,
    config: &RecommenderConfig,
    strategy: Strategy,
    subject: &str,
    limit: usize,
    json: bool,
) -> Result<()> {
    let facade = build_facade(repo, config).await?;

    match facade.recommend(strategy, subject, limit) {
        Ok(outcome) => print_outcome(&outcome, &format!("{} recommendations for {}", strategy, subject), json),
        Err(RecommendError::UnknownEntity(unknown)) => Err(anyhow!(
            "{} is not in the dataset, no {} recommendations possible",
            unknown,
            strategy
        )),
        Err(err) => Err(err.into()),
    }
}

/// Handle the 'similar' command
async fn handle_similar(
    repo: Arc<InteractionRepository>,
    config: &RecommenderConfig,
    title: &str,
    limit: usize,
    json: bool,
) -> Result<()> {
    let facade = build_facade(repo, config).await?;
    let outcome = facade
        .similar_to_title(title, limit)
        .with_context(|| format!("No book titled '{}'", title))?;
    print_outcome(&outcome, &format!("Books similar to '{}'", title), json)
}

/// Handle the 'train' command
async fn handle_train(
    repo: Arc<InteractionRepository>,
    config: &RecommenderConfig,
    json: bool,
) -> Result<()> {
    let stop = StopSignal::new();
    stop_on_ctrl_c(stop.clone());

    let trainer = Trainer::new(config.training.clone()).with_stop_signal(stop);
    let start = Instant::now();
    let report = tokio::task::spawn_blocking(move || trainer.fit(&repo))
        .await
        .context("Training task failed")?
        .context("Training did not produce a model")?;
    info!("Training finished in {:.2?}", start.elapsed());

    if json {
        println!("{}", serde_json::to_string_pretty(&report.history)?);
    } else {
        print_learning_curve(&report);
    }
    Ok(())
}

/// Handle the 'stats' command
fn handle_stats(repo: &InteractionRepository, json: bool) -> Result<()> {
    let (users, items, interactions) = repo.counts();
    let (min, max) = repo
        .rating_range()
        .ok_or_else(|| anyhow!("Dataset has no ratings"))?;
    let sparsity = 1.0 - interactions as f64 / (users as f64 * items as f64);
    let with_metadata = repo
        .item_ids()
        .iter()
        .filter(|id| repo.metadata(id).is_some())
        .count();

    if json {
        let stats = serde_json::json!({
            "users": users,
            "items": items,
            "interactions": interactions,
            "items_with_metadata": with_metadata,
            "rating_min": min,
            "rating_max": max,
            "sparsity": sparsity,
        });
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "Dataset statistics".bold().blue());
    println!("{}Users: {}", "• ".green(), users);
    println!("{}Books: {} ({} with metadata)", "• ".green(), items, with_metadata);
    println!("{}Ratings: {}", "• ".green(), interactions);
    println!("{}Rating range: {} - {}", "• ".cyan(), min, max);
    println!("{}Sparsity: {:.4}%", "• ".cyan(), sparsity * 100.0);
    Ok(())
}

/// A user's rating activity: (ratings, average, top rated as (item id, title, rating))
fn user_profile(
    repo: &InteractionRepository,
    user_id: &str,
    top: usize,
) -> Result<(usize, f32, Vec<(String, String, f32)>)> {
    let user = repo
        .user_index(user_id)
        .with_context(|| format!("User {} not found", user_id))?;
    let ratings = repo.rated_item_indices(user);
    let avg = ratings.iter().map(|&(_, r)| r).sum::<f32>() / ratings.len().max(1) as f32;

    let mut top_rated = ratings.to_vec();
    top_rated.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let books = top_rated
        .iter()
        .take(top)
        .map(|&(item, rating)| {
            let item_id = repo.items().decode(item).unwrap_or("?");
            let title = repo
                .metadata_at(item)
                .and_then(|m| m.title.as_deref())
                .unwrap_or(item_id);
            (item_id.to_string(), title.to_string(), rating)
        })
        .collect();
    Ok((ratings.len(), avg, books))
}

fn user_json(repo: &InteractionRepository, user_id: &str) -> Result<serde_json::Value> {
    let (count, avg, books) = user_profile(repo, user_id, 10)?;
    let top_rated: Vec<serde_json::Value> = books
        .into_iter()
        .map(|(item_id, title, rating)| {
            serde_json::json!({ "item_id": item_id, "title": title, "rating": rating })
        })
        .collect();
    Ok(serde_json::json!({
        "user_id": user_id,
        "ratings": count,
        "average_rating": avg,
        "top_rated": top_rated,
    }))
}

/// Handle the 'user' command
fn handle_user(repo: &InteractionRepository, user_id: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&user_json(repo, user_id)?)?);
        return Ok(());
    }

    let (count, avg, books) = user_profile(repo, user_id, 10)?;
    println!("{}", format!("User ID: {}", user_id).bold().blue());
    println!("{}Number of ratings: {}", "• ".cyan(), count);
    println!("{}Average rating: {:.2}", "• ".cyan(), avg);
    println!("Top rated books:");
    for (_, title, rating) in books {
        println!("  - {} (Rating: {})", title, rating);
    }
    Ok(())
}

fn print_outcome(outcome: &RecommendOutcome, header: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    println!("{}", header.bold().blue());
    match outcome {
        RecommendOutcome::InsufficientData => {
            println!("{}", "Not enough data to recommend anything new.".yellow());
        }
        RecommendOutcome::Ranked(items) => {
            for (rank, rec) in items.iter().enumerate() {
                println!(
                    "{}. {} by {} [{}] - Score: {:.3}",
                    (rank + 1).to_string().green(),
                    rec.title.as_deref().unwrap_or("(untitled)"),
                    rec.author.as_deref().unwrap_or("unknown author"),
                    rec.item_id,
                    rec.score
                );
            }
        }
    }
    Ok(())
}

fn print_learning_curve(report: &TrainingReport) {
    println!("{}", "Learning curve".bold().blue());
    println!(
        "{:>6} {:>10} {:>10} {:>10} {:>10}",
        "epoch", "loss", "rmse", "val_loss", "val_rmse"
    );
    for stats in &report.history {
        let line = format!(
            "{:>6} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
            stats.epoch, stats.train_loss, stats.train_rmse, stats.val_loss, stats.val_rmse
        );
        if stats.epoch == report.best_epoch {
            println!("{}", line.green());
        } else {
            println!("{}", line);
        }
    }
    println!(
        "{} Best epoch {} with val RMSE {:.4} (untrained {:.4}){}",
        "✓".green(),
        report.best_epoch,
        report.best_val_rmse,
        report.baseline_rmse,
        if report.interrupted { ", interrupted" } else { "" }
    );
}
