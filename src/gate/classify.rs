use crate::platform::types::WorkflowRunSummary;

/// Matching runs split by conclusion. Recomputed from scratch on every poll.
#[derive(Debug, Default)]
pub struct Classification<'a> {
    pub matching: Vec<&'a WorkflowRunSummary>,
    pub successful: Vec<&'a WorkflowRunSummary>,
    pub unsuccessful: Vec<&'a WorkflowRunSummary>,
    pub pending: Vec<&'a WorkflowRunSummary>,
}

impl<'a> Classification<'a> {
    pub fn of(runs: &'a [WorkflowRunSummary], required: &[String]) -> Self {
        let mut classification = Self::default();

        for run in runs {
            let Some(name) = run.name.as_deref() else {
                continue;
            };
            if !required.iter().any(|r| r == name) {
                continue;
            }

            classification.matching.push(run);
            match run.conclusion.as_deref() {
                None => classification.pending.push(run),
                Some(conclusion) if is_successful(conclusion) => {
                    classification.successful.push(run)
                }
                Some(_) => classification.unsuccessful.push(run),
            }
        }

        classification
    }

    /// Whether `run_id` is listed among the matching runs with a conclusion.
    pub fn has_concluded(&self, run_id: u64) -> bool {
        self.matching
            .iter()
            .any(|run| run.id == run_id && run.conclusion.is_some())
    }

    /// Required names without a single matching run, first occurrence order.
    pub fn missing<'r>(&self, required: &'r [String]) -> Vec<&'r str> {
        let mut missing: Vec<&str> = Vec::new();
        for name in required {
            let seen = self
                .matching
                .iter()
                .any(|run| run.name.as_deref() == Some(name.as_str()));
            if !seen && !missing.contains(&name.as_str()) {
                missing.push(name);
            }
        }
        missing
    }
}

fn is_successful(conclusion: &str) -> bool {
    matches!(conclusion, "success" | "skipped")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(id: u64, name: Option<&str>, conclusion: Option<&str>) -> WorkflowRunSummary {
        WorkflowRunSummary {
            id,
            name: name.map(str::to_string),
            conclusion: conclusion.map(str::to_string),
            html_url: format!("https://example.com/runs/{id}"),
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_partition_is_disjoint_and_complete() {
        let runs = vec![
            run(1, Some("Build"), Some("success")),
            run(2, Some("Test"), Some("skipped")),
            run(3, Some("Lint"), Some("cancelled")),
            run(4, Some("Deploy"), None),
            run(5, Some("Docs"), Some("failure")),
            run(6, None, Some("failure")),
        ];
        let required = names(&["Build", "Test", "Lint", "Deploy"]);

        let c = Classification::of(&runs, &required);
        let ids = |v: &[&WorkflowRunSummary]| v.iter().map(|r| r.id).collect::<Vec<_>>();

        assert_eq!(ids(&c.matching), vec![1, 2, 3, 4]);
        assert_eq!(ids(&c.successful), vec![1, 2]);
        assert_eq!(ids(&c.unsuccessful), vec![3]);
        assert_eq!(ids(&c.pending), vec![4]);
        assert_eq!(
            c.successful.len() + c.unsuccessful.len() + c.pending.len(),
            c.matching.len()
        );
    }

    #[test]
    fn test_duplicate_required_names_count_runs_once() {
        let runs = vec![run(1, Some("Build"), Some("success"))];
        let required = names(&["Build", "Build"]);

        let c = Classification::of(&runs, &required);
        assert_eq!(c.matching.len(), 1);
        assert!(c.missing(&required).is_empty());
    }

    #[test]
    fn test_missing_and_has_concluded() {
        let runs = vec![
            run(7, Some("Test"), Some("success")),
            run(8, Some("Test"), None),
        ];
        let required = names(&["Build", "Test", "Build", "Lint"]);

        let c = Classification::of(&runs, &required);
        assert!(c.has_concluded(7));
        assert!(!c.has_concluded(8));
        assert!(!c.has_concluded(9));
        assert_eq!(c.missing(&required), vec!["Build", "Lint"]);
    }

    #[test]
    fn test_name_match_is_exact() {
        let runs = vec![run(1, Some("build"), Some("failure"))];
        let c = Classification::of(&runs, &names(&["Build"]));
        assert!(c.matching.is_empty());
    }
}
