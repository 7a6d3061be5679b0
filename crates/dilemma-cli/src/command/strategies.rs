use dilemma_core::catalog;

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct StrategiesArg {
    /// Print the list as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, serde::Serialize)]
struct StrategyInfo {
    name: &'static str,
    description: &'static str,
    default_lineup: bool,
}

fn strategy_infos() -> anyhow::Result<Vec<StrategyInfo>> {
    catalog::names()
        .map(|name| -> anyhow::Result<StrategyInfo> {
            Ok(StrategyInfo {
                name,
                description: catalog::describe(name)?,
                default_lineup: catalog::DEFAULT_LINEUP.contains(&name),
            })
        })
        .collect()
}

pub(crate) fn run(arg: &StrategiesArg) -> anyhow::Result<()> {
    let infos = strategy_infos()?;
    if arg.json {
        return util::print_json(&infos);
    }

    let width = util::name_width(infos.iter().map(|i| i.name), 8);
    for info in &infos {
        let marker = if info.default_lineup { "*" } else { " " };
        println!("{marker} {:<width$}  {}", info.name, info.description);
    }
    println!();
    println!("* default lineup");
    Ok(())
}
