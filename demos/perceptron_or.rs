use rust_learning_rules::{Builtin, Dataset, PerceptronConfig, PerceptronState};

fn main() -> rust_learning_rules::Result<()> {
    let or = Dataset::builtin(Builtin::Or);
    let mut p = PerceptronState::reset(&or, &PerceptronConfig::default())?;

    for epoch in 0..3 {
        for _ in 0..or.len() {
            let s = p.step(&or, None)?;
            println!(
                "epoch={epoch} x={:?} y={} score={:+.1} mistake={} w={:?} b={:+.1}",
                s.x, s.y, s.score, s.mistake, s.w_after, s.b_after
            );
        }
    }

    if let Some(line) = p.linear_field()?.line(&Default::default()) {
        println!(
            "boundary: ({:.3}, {:.3}) -> ({:.3}, {:.3})",
            line.start.x, line.start.y, line.end.x, line.end.y
        );
    }
    Ok(())
}
