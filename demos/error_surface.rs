use rust_learning_rules::{Dataset, ModelKind, SweepConfig};

fn main() -> rust_learning_rules::Result<()> {
    let name = std::env::args().nth(1).unwrap_or_else(|| "or".to_owned());
    let kind: ModelKind = std::env::args()
        .nth(2)
        .map(|s| s.parse::<ModelKind>())
        .transpose()?
        .unwrap_or(ModelKind::Lms);
    let dataset = Dataset::named(&name)?;

    let config = SweepConfig {
        steps: 11,
        ..SweepConfig::default()
    };
    let grid = config.sweep(kind, &dataset)?;

    println!("{kind} error surface on {name}, w1 rows x w2 columns");
    for row in &grid {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:6.3}")).collect();
        println!("{}", cells.join(" "));
    }
    Ok(())
}
