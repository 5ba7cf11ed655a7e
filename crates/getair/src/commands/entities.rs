//! Entity catalog handler.

use tabled::Tabled;

use getair_core::entity;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::context::CliContext;

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Entity")]
    id: String,
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let (ctx, snapshot) = CliContext::connect(global).await?;

    let catalog = entity::build_catalog(&ctx.entity_context(), &snapshot);
    let rows: Vec<EntityRow> = catalog
        .iter()
        .map(|e| EntityRow {
            id: e.unique_id().to_owned(),
            domain: e.domain().to_string(),
            name: e.name(&snapshot),
            state: e
                .state(&snapshot)
                .map_or_else(output::dash, |v| v.to_string()),
        })
        .collect();

    if !global.quiet {
        println!("{}", output::render_table(rows));
    }
    Ok(())
}
