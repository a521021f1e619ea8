//! Skill extraction from listing text.

/// Technology and skill terms, in output order.
///
/// Matching is a case-insensitive substring test, so very short terms
/// (`C`, `R`, `Go`) are spelled in forms that rarely occur by accident.
pub const SKILL_VOCABULARY: &[&str] = &[
    // Languages
    "Python",
    "Java",
    "JavaScript",
    "TypeScript",
    "C++",
    "C#",
    "Rust",
    "Golang",
    "Ruby",
    "PHP",
    "Swift",
    "Kotlin",
    "Scala",
    "Perl",
    "Haskell",
    "Elixir",
    "Erlang",
    "Clojure",
    "Objective-C",
    "Dart",
    "Lua",
    "MATLAB",
    "Fortran",
    "COBOL",
    "Groovy",
    "F#",
    "Bash",
    "PowerShell",
    "Solidity",
    "Zig",
    // Web
    "HTML",
    "CSS",
    "Sass",
    "React",
    "Angular",
    "Vue",
    "Svelte",
    "Next.js",
    "Node.js",
    "Express",
    "jQuery",
    "Redux",
    "GraphQL",
    "REST",
    "gRPC",
    "WebSocket",
    "Webpack",
    "Tailwind",
    "Bootstrap",
    // Backend frameworks
    "Django",
    "Flask",
    "FastAPI",
    "Spring",
    "Hibernate",
    "Rails",
    "Laravel",
    "Symfony",
    ".NET",
    "ASP.NET",
    "Actix",
    "Tokio",
    "Phoenix",
    // Data stores
    "SQL",
    "PostgreSQL",
    "MySQL",
    "SQLite",
    "Oracle",
    "SQL Server",
    "MongoDB",
    "Redis",
    "Cassandra",
    "DynamoDB",
    "Elasticsearch",
    "Neo4j",
    "Snowflake",
    "BigQuery",
    "Redshift",
    "CouchDB",
    "MariaDB",
    // Data and ML
    "Pandas",
    "NumPy",
    "SciPy",
    "scikit-learn",
    "TensorFlow",
    "PyTorch",
    "Keras",
    "Spark",
    "Hadoop",
    "Kafka",
    "Airflow",
    "dbt",
    "Tableau",
    "Power BI",
    "Machine Learning",
    "Deep Learning",
    "NLP",
    "Computer Vision",
    "LLM",
    "Data Science",
    "ETL",
    // Cloud and infrastructure
    "AWS",
    "Azure",
    "GCP",
    "Google Cloud",
    "Docker",
    "Kubernetes",
    "Terraform",
    "Ansible",
    "Puppet",
    "Chef",
    "Helm",
    "OpenShift",
    "Serverless",
    "Lambda",
    "Linux",
    "Unix",
    "Nginx",
    "Apache",
    "Prometheus",
    "Grafana",
    "Datadog",
    "Splunk",
    "RabbitMQ",
    "Microservices",
    // Tooling and practice
    "Git",
    "GitHub",
    "GitLab",
    "Bitbucket",
    "Jenkins",
    "CircleCI",
    "CI/CD",
    "DevOps",
    "Agile",
    "Scrum",
    "Kanban",
    "Jira",
    "TDD",
    "Unit Testing",
    "Selenium",
    "Cypress",
    "Jest",
    "JUnit",
    "pytest",
    // Mobile
    "iOS",
    "Android",
    "React Native",
    "Flutter",
    "Xamarin",
    // Security and systems
    "OAuth",
    "Cybersecurity",
    "Penetration Testing",
    "Networking",
    "Embedded",
    "RTOS",
    "FPGA",
    "Blockchain",
];

/// Vocabulary terms found in `text`, in vocabulary order, without duplicates.
pub fn scan_skills(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let haystack = text.to_lowercase();
    let mut found: Vec<String> = Vec::new();
    for term in SKILL_VOCABULARY {
        if haystack.contains(&term.to_lowercase()) && !found.iter().any(|f| f == term) {
            found.push(term.to_string());
        }
    }
    found
}

/// Split a comma-separated skills field into trimmed, non-empty tokens.
pub fn split_skill_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
