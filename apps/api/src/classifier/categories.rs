//! Static category table. Codes are the classifier's class indices (0–24).

pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Job-category labels indexed by category code.
pub const CATEGORIES: [&str; 25] = [
    "Advocate",
    "Arts",
    "Automation Testing",
    "Blockchain",
    "Business Analyst",
    "Civil Engineer",
    "Data Science",
    "Database",
    "DevOps Engineer",
    "DotNet Developer",
    "ETL Developer",
    "Electrical Engineering",
    "HR",
    "Hadoop",
    "Health and fitness",
    "Java Developer",
    "Mechanical Engineer",
    "Network Security Engineer",
    "Operations Manager",
    "PMO",
    "Python Developer",
    "SAP Developer",
    "Sales",
    "Testing",
    "Web Designing",
];

/// Resolves a category code to its label. Codes outside the table resolve to
/// [`UNKNOWN_CATEGORY`] instead of failing.
pub fn lookup(code: i64) -> &'static str {
    usize::try_from(code)
        .ok()
        .and_then(|index| CATEGORIES.get(index))
        .copied()
        .unwrap_or(UNKNOWN_CATEGORY)
}
