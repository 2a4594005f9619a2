use anyhow::{
    Context,
    Result,
};
use deployments::{
    ArtifactCatalog,
    ContractKind,
    ContractRecord,
    WalletIdentity,
};
use orchestrator::{
    RegistryApi,
    cache::fetch_address_cache,
};
use std::{
    io::{
        BufRead,
        Write,
    },
    path::Path,
};

pub async fn list<R: RegistryApi>(
    registry: &R,
    wallet: &WalletIdentity,
    out: &mut impl Write,
) -> Result<()> {
    let records = registry
        .fetch_contracts(wallet)
        .await
        .with_context(|| format!("fetching registry for {wallet}"))?;
    if records.is_empty() {
        writeln!(out, "No contracts recorded for {wallet}")?;
        return Ok(());
    }
    writeln!(out, "Contracts recorded for {wallet}:")?;
    for (i, record) in records.iter().enumerate() {
        writeln!(out, "  {:>2}. {:<18} {}", i + 1, record.contract_type, record.address)?;
    }
    Ok(())
}

pub async fn save<R: RegistryApi>(
    registry: &R,
    wallet: &WalletIdentity,
    kind: ContractKind,
    address: &str,
    out: &mut impl Write,
) -> Result<()> {
    let address = address.trim();
    if address.is_empty() {
        anyhow::bail!("contract address must not be empty");
    }
    let record = ContractRecord::new(kind, address);
    registry
        .save_contract(wallet, &record)
        .await
        .with_context(|| format!("saving {kind} for {wallet}"))?;
    writeln!(out, "Saved {kind} at {address} for {wallet}")?;
    Ok(())
}

/// Delete every record for `wallet`. Without `assume_yes` the operator is
/// asked first and anything but "y"/"yes" aborts.
pub async fn delete<R: RegistryApi>(
    registry: &R,
    wallet: &WalletIdentity,
    assume_yes: bool,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    if !assume_yes {
        let question = format!("Delete all recorded contracts for {wallet}?");
        if !confirm(&question, input, out)? {
            writeln!(out, "Aborted")?;
            return Ok(());
        }
    }
    registry
        .delete_contracts(wallet)
        .await
        .with_context(|| format!("deleting registry for {wallet}"))?;
    writeln!(out, "Deleted registry for {wallet}")?;
    Ok(())
}

/// Rebuild the address cache the way a connecting session would and print it.
pub async fn sync<R: RegistryApi>(
    registry: &R,
    wallet: &WalletIdentity,
    out: &mut impl Write,
) -> Result<()> {
    let cache = fetch_address_cache(registry, wallet)
        .await
        .with_context(|| format!("syncing addresses for {wallet}"))?;
    writeln!(out, "Known addresses for {wallet}:")?;
    for kind in ContractKind::ALL {
        let address = cache.get(kind).unwrap_or("-");
        writeln!(out, "  {:<18} {}", kind, address)?;
    }
    Ok(())
}

pub fn artifacts(dir: &Path, out: &mut impl Write) -> Result<()> {
    let catalog = ArtifactCatalog::load_from_dir(dir)
        .with_context(|| format!("loading artifacts from {}", dir.display()))?;
    writeln!(out, "{} artifact(s) in {}", catalog.len(), dir.display())?;
    for kind in ContractKind::ALL {
        match catalog.get(kind) {
            Some(artifact) => writeln!(
                out,
                "  {:<18} {} bytes  sha256 {}",
                kind,
                artifact.bytecode.len(),
                artifact.bytecode_hash()
            )?,
            None => writeln!(out, "  {:<18} missing", kind)?,
        }
    }
    Ok(())
}

fn confirm(question: &str, input: &mut impl BufRead, out: &mut impl Write) -> Result<bool> {
    write!(out, "{question} [y/N] ")?;
    out.flush()?;
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("reading confirmation")?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
