use anyhow::{Result, bail};

use citypulse_core::location::{
    CatalogFilters, LocationCatalogEntry, LocationSearchStore, SearchOutcome,
};

use super::App;

fn print_entries(entries: &Vec<LocationCatalogEntry>) {
    for (index, entry) in entries.iter().enumerate() {
        let region = [entry.division1_code.as_deref(), entry.country_code.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        if region.is_empty() {
            println!("{:>3}. {}", index + 1, entry.name);
        } else {
            println!("{:>3}. {} ({region})", index + 1, entry.name);
        }
    }
}

pub async fn list(app: &App, country: Option<String>, division1: Option<String>) -> Result<()> {
    let store = LocationSearchStore::new(app.catalog()?, &app.config.client);
    let filters = CatalogFilters {
        country_code: country,
        division1_code: division1,
    };
    store.fetch_catalog(filters).await?;
    let state = store.snapshot();
    app.emit(&state.catalog, print_entries)
}

/// Searches and optionally saves the picked city, as the picker screen does.
pub async fn search(app: &App, term: &str, pick: Option<usize>) -> Result<()> {
    let store = LocationSearchStore::new(app.catalog()?, &app.config.client);

    match store.search(term).await? {
        SearchOutcome::TooShort => {
            println!(
                "Type at least {} characters to search",
                app.config.client.min_search_len
            );
            return Ok(());
        }
        SearchOutcome::Reset => bail!("Search term is empty"),
        SearchOutcome::Applied { .. } => {}
    }

    let results = store.snapshot().results;
    store.close();

    let Some(pick) = pick else {
        return app.emit(&results, print_entries);
    };
    let Some(entry) = pick.checked_sub(1).and_then(|i| results.get(i)).cloned() else {
        bail!("No result #{pick} ({} results)", results.len());
    };

    store.select(entry.clone());
    let backend = app.backend()?;
    let (session, _) = app.signed_in(&backend).await?;
    let profile = session.set_location(&entry.name).await?;
    app.emit(&profile, |_| println!("City set to {}", entry.name))
}
