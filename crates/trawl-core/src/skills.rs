use std::collections::BTreeMap;

use crate::classify::contains_term;

/// Technology terms recognised in titles, tags and descriptions.
pub const DEFAULT_VOCABULARY: &[&str] = &[
    "Rust", "Go", "Golang", "Python", "Java", "Kotlin", "Scala", "C++", "C#", ".NET",
    "ASP.NET", "JavaScript", "TypeScript", "Node.js", "React", "Angular", "Vue", "Svelte",
    "Next.js", "PHP", "Laravel", "Symfony", "Ruby", "Rails", "Swift", "Objective-C", "Flutter",
    "Dart", "Elixir", "Erlang", "Haskell", "Clojure", "SQL", "PostgreSQL", "MySQL", "MongoDB",
    "Redis", "Kafka", "RabbitMQ", "Elasticsearch", "GraphQL", "REST", "gRPC", "Docker",
    "Kubernetes", "Terraform", "Ansible", "AWS", "GCP", "Azure", "Linux", "Git", "CI/CD",
    "Spark", "Hadoop", "Airflow", "Pandas", "PyTorch", "TensorFlow", "Django", "Flask",
    "FastAPI", "Spring", "Hibernate", "Unity", "Unreal", "Figma", "Selenium", "Playwright",
    "Solidity", "WebAssembly", "Tokio",
];

/// Deduplicate skill tokens case-insensitively, keeping the first spelling
/// seen, and return them sorted case-insensitively.
pub fn dedup_skills<I, S>(skills: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for skill in skills {
        let trimmed = skill.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        seen.entry(trimmed.to_lowercase())
            .or_insert_with(|| trimmed.to_string());
    }
    seen.into_values().collect()
}

/// Scan free text for vocabulary terms.
pub fn extract_skills(text: &str, vocabulary: &[&str]) -> Vec<String> {
    let haystack = text.to_lowercase();
    dedup_skills(
        vocabulary
            .iter()
            .filter(|term| contains_term(&haystack, &term.to_lowercase())),
    )
}
