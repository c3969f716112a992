use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use crate::database::{DatabaseError, DbPool};

/// Observation types listed individually before the rest is grouped
const TOP_CAUSES: usize = 5;
const OTHER_CAUSES: &str = "Autres";

/// One intervention as used by the technician statistics
#[derive(Debug, Clone, FromRow)]
pub struct InterventionSample {
    pub bon_id: i64,
    pub matricule: String,
    pub nom: Option<String>,
    pub heure_debut: Option<String>,
    pub heure_fin: Option<String>,
    pub total_heures: Option<String>,
    pub chantier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianPerformance {
    /// Technician matricule
    pub id: String,
    pub nom: String,
    pub total_interventions: i64,
    pub total_heures: Decimal,
    /// Percentage of the technician's bons that needed another visit
    pub taux_rappel: Decimal,
    /// Site revisited the most among those bons
    pub chantier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CauseCount {
    pub cause: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainCount {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureAnalysis {
    /// Share of visited bons that were visited more than once (0..1)
    pub taux_rappel: Decimal,
    pub pannes_par_cause: Vec<CauseCount>,
    pub pannes_par_domaine: Vec<DomainCount>,
}

pub struct PerformanceService {
    pool: DbPool,
}

impl PerformanceService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn technicians(&self) -> Result<Vec<TechnicianPerformance>, DatabaseError> {
        let samples = sqlx::query_as::<_, InterventionSample>(
            r#"
            SELECT
                i.bon_id,
                TRIM(i.matricule) AS matricule,
                COALESCE(p.nom || ' ' || p.prenoms, i.prenoms) AS nom,
                i.heure_debut,
                i.heure_fin,
                i.total_heures,
                COALESCE(NULLIF(TRIM(b.adresse), ''), b.client) AS chantier
            FROM interventions i
            JOIN bonsdetravail b ON b.id = i.bon_id
            LEFT JOIN personnels p ON p.matricule = TRIM(i.matricule)
            WHERE i.matricule IS NOT NULL AND TRIM(i.matricule) <> ''
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let visits = self.visits_per_bon().await?;
        Ok(technician_stats(&samples, &visits))
    }

    pub async fn failure_analysis(&self) -> Result<FailureAnalysis, DatabaseError> {
        let visits = self.visits_per_bon().await?;

        let causes = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT TRIM(type) AS cause, COUNT(*) AS count
            FROM observations
            WHERE type IS NOT NULL AND TRIM(type) <> ''
            GROUP BY TRIM(type)
            ORDER BY count DESC, cause
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let domains = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT TRIM(chantier) AS name, COUNT(*) AS value
            FROM observations
            WHERE chantier IS NOT NULL AND TRIM(chantier) <> ''
            GROUP BY TRIM(chantier)
            ORDER BY value DESC, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(FailureAnalysis {
            taux_rappel: recall_rate(&visits),
            pannes_par_cause: top_causes(causes),
            pannes_par_domaine: domains
                .into_iter()
                .map(|(name, value)| DomainCount { name, value })
                .collect(),
        })
    }

    async fn visits_per_bon(&self) -> Result<HashMap<i64, i64>, DatabaseError> {
        let rows = sqlx::query_as::<_, (i64, i64)>("SELECT bon_id, COUNT(*) FROM interventions GROUP BY bon_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }
}

/// Groups interventions by technician. `visits` is the number of
/// interventions recorded on each bon, all technicians included.
pub fn technician_stats(samples: &[InterventionSample], visits: &HashMap<i64, i64>) -> Vec<TechnicianPerformance> {
    let mut by_tech: BTreeMap<&str, Vec<&InterventionSample>> = BTreeMap::new();
    for sample in samples {
        by_tech.entry(sample.matricule.as_str()).or_default().push(sample);
    }

    let mut stats: Vec<TechnicianPerformance> = by_tech
        .into_iter()
        .map(|(matricule, rows)| {
            let total_heures: Decimal = rows
                .iter()
                .map(|r| hours_worked(r.heure_debut.as_deref(), r.heure_fin.as_deref(), r.total_heures.as_deref()))
                .sum();

            let bons: HashSet<i64> = rows.iter().map(|r| r.bon_id).collect();
            let revisited: HashSet<i64> = bons
                .iter()
                .copied()
                .filter(|id| visits.get(id).copied().unwrap_or(0) > 1)
                .collect();

            let mut revisits_per_site: BTreeMap<&str, i64> = BTreeMap::new();
            let mut counted = HashSet::new();
            for row in &rows {
                let Some(site) = row.chantier.as_deref() else {
                    continue;
                };
                if revisited.contains(&row.bon_id) && counted.insert(row.bon_id) {
                    *revisits_per_site.entry(site).or_default() += visits.get(&row.bon_id).copied().unwrap_or(0);
                }
            }
            // BTreeMap order makes ties resolve alphabetically
            let chantier = revisits_per_site
                .into_iter()
                .fold(None::<(&str, i64)>, |best, (site, n)| match best {
                    Some((_, best_n)) if best_n >= n => best,
                    _ => Some((site, n)),
                })
                .map(|(site, _)| site.to_string());

            let nom = rows
                .iter()
                .find_map(|r| r.nom.clone().filter(|n| !n.trim().is_empty()))
                .unwrap_or_else(|| matricule.to_string());

            TechnicianPerformance {
                id: matricule.to_string(),
                nom,
                total_interventions: rows.len() as i64,
                total_heures: total_heures.round_dp(2),
                taux_rappel: percentage(revisited.len(), bons.len()),
                chantier,
            }
        })
        .collect();

    stats.sort_by(|a, b| {
        b.total_interventions
            .cmp(&a.total_interventions)
            .then_with(|| a.id.cmp(&b.id))
    });
    stats
}

/// Share of visited bons with more than one visit, as a fraction
pub fn recall_rate(visits: &HashMap<i64, i64>) -> Decimal {
    let visited = visits.values().filter(|&&n| n > 0).count();
    if visited == 0 {
        return Decimal::ZERO;
    }
    let revisited = visits.values().filter(|&&n| n > 1).count();
    (Decimal::from(revisited as i64) / Decimal::from(visited as i64)).round_dp(3)
}

/// Keeps the first five causes and folds the rest into `Autres`.
/// Input must be sorted by count, highest first.
pub fn top_causes(causes: Vec<(String, i64)>) -> Vec<CauseCount> {
    let mut top: Vec<CauseCount> = causes
        .iter()
        .take(TOP_CAUSES)
        .map(|(cause, count)| CauseCount {
            cause: cause.clone(),
            count: *count,
        })
        .collect();

    let rest: i64 = causes.iter().skip(TOP_CAUSES).map(|(_, count)| count).sum();
    if rest > 0 {
        top.push(CauseCount {
            cause: OTHER_CAUSES.to_string(),
            count: rest,
        });
    }
    top
}

fn percentage(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part as i64) * Decimal::ONE_HUNDRED / Decimal::from(whole as i64)).round_dp(1)
}

/// Hours of one intervention: end minus start when both clock times parse
/// (wrapping past midnight), else the recorded total, else zero.
pub fn hours_worked(debut: Option<&str>, fin: Option<&str>, total: Option<&str>) -> Decimal {
    if let (Some(start), Some(end)) = (debut.and_then(parse_clock), fin.and_then(parse_clock)) {
        let diff = end - start;
        return if diff < Decimal::ZERO {
            diff + Decimal::from(24)
        } else {
            diff
        };
    }
    total.and_then(parse_duration).unwrap_or(Decimal::ZERO)
}

/// "08:30", "8h30", "8H", "14:00:00" as hours since midnight
pub fn parse_clock(value: &str) -> Option<Decimal> {
    let (hours, minutes) = split_hours_minutes(value)?;
    if hours > 24 {
        return None;
    }
    Some(to_hours(hours, minutes))
}

/// "7.5", "7,5", "7h30" or "7:30" as a number of hours
pub fn parse_duration(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if trimmed.contains(|c: char| c == ':' || c == 'h' || c == 'H') {
        let (hours, minutes) = split_hours_minutes(trimmed)?;
        return Some(to_hours(hours, minutes));
    }
    Decimal::from_str(&trimmed.replace(',', "."))
        .ok()
        .filter(|d| *d >= Decimal::ZERO)
}

fn split_hours_minutes(value: &str) -> Option<(u32, u32)> {
    let lowered = value.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    let mut parts = lowered.splitn(3, |c| c == ':' || c == 'h');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = match parts.next().map(str::trim) {
        None | Some("") => 0,
        Some(m) => m.parse().ok()?,
    };
    if minutes >= 60 {
        return None;
    }
    Some((hours, minutes))
}

fn to_hours(hours: u32, minutes: u32) -> Decimal {
    Decimal::from(hours) + Decimal::from(minutes) / Decimal::from(60)
}
