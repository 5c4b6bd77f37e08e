//! Recommendation generator: one fix per issue, plus threshold advice.

use crate::matcher::N_PLUS_ONE_TITLE;
use crate::models::{Issue, Metrics, Recommendation};

const FALLBACK_DESCRIPTION: &str = "No specific recommendation available";

/// Network-request estimate above which batching advice is appended.
pub const BATCHING_THRESHOLD: f64 = 10.0;
/// Database-load estimate above which query advice is appended.
pub const QUERY_OPTIMIZATION_THRESHOLD: f64 = 5.0;

const BATCH_FETCH_EXAMPLE: &str = r#"
const fetchProductsWithDetails = async (productIds) => {
  const response = await fetch('/api/products/batch', {
    method: 'POST',
    body: JSON.stringify({ ids: productIds }),
  });
  return response.json();
};"#;

const REQUEST_BATCHING_EXAMPLE: &str = r#"
const batchRequests = async (requests) => {
  return Promise.all(
    requests.map(req => fetch(req.url, req.options))
  );
};"#;

const QUERY_OPTIMIZATION_EXAMPLE: &str = r#"
const getProductsWithCategories = async () => {
  return await prisma.product.findMany({
    include: { category: true },
    where: { active: true },
    orderBy: { createdAt: 'desc' },
  });
};"#;

/// Example snippet for an issue title; empty when the title is unknown.
pub fn example_code(title: &str) -> &'static str {
    match title {
        N_PLUS_ONE_TITLE => BATCH_FETCH_EXAMPLE,
        _ => "",
    }
}

pub fn generate(issues: &[Issue], metrics: &Metrics) -> Vec<Recommendation> {
    let mut out: Vec<Recommendation> = issues
        .iter()
        .map(|issue| Recommendation {
            title: format!("Fix {}", issue.title),
            description: issue
                .suggestion
                .clone()
                .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string()),
            example_code: example_code(&issue.title).to_string(),
        })
        .collect();

    if metrics.network_requests > BATCHING_THRESHOLD {
        out.push(Recommendation {
            title: "Implement Request Batching".into(),
            description:
                "Reduce the number of network requests by implementing request batching".into(),
            example_code: REQUEST_BATCHING_EXAMPLE.into(),
        });
    }
    if metrics.database_load > QUERY_OPTIMIZATION_THRESHOLD {
        out.push(Recommendation {
            title: "Optimize Database Queries".into(),
            description: "Implement database query optimization techniques".into(),
            example_code: QUERY_OPTIMIZATION_EXAMPLE.into(),
        });
    }
    out
}
