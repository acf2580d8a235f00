use rust_learning_rules::{
    Builtin, ContourConfig, Dataset, MlpConfig, ModelKind, ModelState, ResetParams, Trainer,
};

fn main() -> rust_learning_rules::Result<()> {
    let params = ResetParams::Mlp(MlpConfig {
        hidden_dim: 4,
        lr: 0.5,
        seed: 0,
    });
    let mut trainer = Trainer::new(Dataset::builtin(Builtin::Xor), params)?;
    assert_eq!(trainer.kind(), ModelKind::Mlp);

    for i in 0..4_000 {
        let outcome = trainer.step(None)?;
        if i % 500 == 0 {
            println!("step={i} loss={:.5}", outcome.record.loss());
        }
    }

    for row in trainer.evaluate()? {
        println!("x={:?} y={} p_hat={:.4} pred={}", row.x, row.y, row.p_hat, row.pred);
    }

    let boundary = trainer.boundary(&ContourConfig::default())?;
    println!("decision boundary: {} segments", boundary.decision.len());
    for (i, unit) in boundary.hidden_units.iter().enumerate() {
        println!("hidden unit {i}: {} segments", unit.len());
    }

    if let ModelState::Mlp(mlp) = trainer.state() {
        for (i, template) in mlp.templates()?.iter().enumerate() {
            println!("template {i}: {template:?}");
        }
    }
    Ok(())
}
