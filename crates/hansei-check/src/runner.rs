//! Runs the query matrix over every report kind.

use hansei_client::{ClientError, ReportSession, Transport};
use hansei_core::{Deviation, ReportKind, TotalCheck};
use tracing::{error, info};

use crate::queries::NamedQuery;

/// Result of one report request and its validation.
#[derive(Debug)]
pub struct Outcome {
    /// Report endpoint.
    pub kind: ReportKind,
    /// Query identifier.
    pub case: &'static str,
    /// Validation outcome, or the request error.
    pub result: Result<TotalCheck, ClientError>,
}

impl Outcome {
    /// Whether the request succeeded and the totals agree.
    pub fn passed(&self) -> bool {
        self.result.as_ref().is_ok_and(TotalCheck::is_ok)
    }
}

/// All outcomes of a run.
#[derive(Debug, Default)]
pub struct Summary {
    /// Outcomes in execution order.
    pub outcomes: Vec<Outcome>,
}

impl Summary {
    /// Number of failed checks.
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed()).count()
    }

    /// Whether every check passed.
    pub fn all_passed(&self) -> bool {
        self.failures() == 0
    }
}

/// Fetch and validate every query for every report kind.
pub async fn run_matrix<T>(transport: &T, queries: &[NamedQuery], deviation: Deviation) -> Summary
where
    T: Transport + Clone,
{
    let mut summary = Summary::default();

    for kind in ReportKind::ALL {
        let mut session = ReportSession::new(transport.clone(), kind);

        for case in queries {
            let fetched = session.get(&case.query).await.map(|_| ());
            let result = fetched.map(|()| session.check(deviation));

            match &result {
                Ok(check) if check.is_ok() => {
                    info!(kind = kind.as_str(), case = case.name, %check, "Report totals agree");
                }
                Ok(check) => {
                    error!(kind = kind.as_str(), case = case.name, %check, "Report totals disagree");
                }
                Err(err) => {
                    error!(kind = kind.as_str(), case = case.name, error = %err, "Report request failed");
                }
            }

            summary.outcomes.push(Outcome {
                kind,
                case: case.name,
                result,
            });
        }
    }

    summary
}
