use recast::utils::metrics::MetricsCalculator;
use recast::*;

const DAY: i64 = 86_400_000;

fn sample_dataset() -> Dataset {
    let users = vec![
        User::new("user1", "Alice Johnson")
            .with_preference("action", 0.8)
            .with_preference("sci_fi", 0.9),
        User::new("user2", "Bob Smith").with_preference("comedy", 0.9),
        User::new("user3", "Carol Davis").with_preference("drama", 0.9),
        User::new("user4", "David Wilson").with_preference("action", 0.9),
        User::new("user5", "Eva Brown").with_preference("comedy", 0.8),
    ];

    let movie = |id: &str, name: &str, features: [f64; 4]| {
        ["action", "comedy", "drama", "sci_fi"]
            .iter()
            .zip(features)
            .fold(Item::new(id, name, "Movie"), |item, (feature, weight)| {
                item.with_feature(*feature, weight)
            })
    };

    let items = vec![
        movie("item1", "The Matrix", [0.9, 0.2, 0.6, 1.0]),
        movie("item2", "The Hangover", [0.3, 1.0, 0.2, 0.1]),
        movie("item3", "Titanic", [0.4, 0.1, 1.0, 0.0]),
        movie("item4", "Avengers: Endgame", [1.0, 0.4, 0.7, 0.8]),
        movie("item5", "Blade Runner 2049", [0.7, 0.1, 0.8, 1.0]),
        movie("item6", "Superbad", [0.2, 0.9, 0.3, 0.0]),
        movie("item7", "The Shawshank Redemption", [0.3, 0.2, 1.0, 0.0]),
        movie("item8", "Interstellar", [0.5, 0.1, 0.9, 1.0]),
    ];

    let ratings = [
        ("user1", "item1", 5.0, 1),
        ("user1", "item4", 4.0, 2),
        ("user1", "item8", 5.0, 3),
        ("user2", "item2", 5.0, 1),
        ("user2", "item6", 4.0, 2),
        ("user2", "item4", 3.0, 3),
        ("user3", "item3", 5.0, 1),
        ("user3", "item7", 5.0, 2),
        ("user3", "item8", 4.0, 3),
        ("user4", "item1", 4.0, 1),
        ("user4", "item4", 5.0, 2),
        ("user4", "item5", 4.0, 3),
        ("user5", "item2", 4.0, 1),
        ("user5", "item3", 3.0, 2),
        ("user5", "item6", 5.0, 3),
    ]
    .into_iter()
    .map(|(user, item, rating, days_ago)| {
        Rating::new(user, item, rating).at(1_700_000_000_000 - days_ago * DAY)
    })
    .collect();

    Dataset::new(users, items, ratings)
}

fn main() -> anyhow::Result<()> {
    init_tracing("info");

    let config = Config::default();
    let policy = config.recommendation.duplicate_policy;
    let engine = RecommenderEngine::from_dataset(sample_dataset(), policy)?;
    let store = engine.store();
    println!(
        "Loaded {} users and {} items",
        store.user_count(),
        store.item_count()
    );

    println!("\nTop rated items:");
    for stats in store.top_rated_items(3, None) {
        println!(
            "  {:<28} {:.2} ({} ratings)",
            store.item(&stats.item_id).map_or("Unknown Item", |i| i.name.as_str()),
            stats.average_rating,
            stats.rating_count
        );
    }

    let set = engine.recommendation_set("user1", 5);
    for strategy in Strategy::ALL {
        println!("\n{} recommendations for user1:", strategy);
        for rec in set.get(strategy) {
            let name = store.item(&rec.item_id).map_or("Unknown Item", |i| i.name.as_str());
            println!("  {:<28} {:.3}", name, rec.score);
        }
    }

    let calculator = MetricsCalculator::new(5);
    let lists = vec![set.user_based.clone(), set.item_based.clone(), set.hybrid.clone()];
    println!(
        "\nCatalogue coverage across strategies: {:.2}",
        calculator.calculate_coverage(&lists, store.item_count())
    );

    let series = vec![
        45.0, 52.0, 48.0, 61.0, 55.0, 67.0, 71.0, 63.0, 58.0, 72.0, 68.0, 75.0, 82.0, 79.0, 85.0,
        91.0, 88.0, 94.0, 97.0, 103.0, 99.0, 106.0, 112.0, 108.0, 115.0, 121.0, 118.0, 125.0,
        131.0, 128.0,
    ];

    let model = ForecastModel::new(series.clone(), ArimaParams::new(2, 1, 2)).with_seed(2024);
    println!("\n{} forecast:", model.params());
    for point in model.forecast(7).iter().filter(|p| p.predicted) {
        println!("  {} -> {:.2}", point.timestamp, point.value);
    }

    let evaluator = AccuracyEvaluator::with_model(model, config.evaluation.train_ratio)?;
    let evaluation = evaluator.evaluate(&series);
    println!(
        "\nHold-out accuracy: {:.1}% ({} train / {} test)",
        evaluation.accuracy * 100.0,
        evaluation.train_len,
        evaluation.test_len
    );

    Ok(())
}
