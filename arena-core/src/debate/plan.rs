use crate::models::ArchitecturePlan;

const COMPONENTS: [&str; 5] = [
    "Frontend: Next.js 14 with TypeScript and Tailwind CSS",
    "Backend: Node.js API with RESTful endpoints",
    "Database: PostgreSQL with Prisma ORM",
    "Authentication: NextAuth.js with JWT",
    "Deployment: Vercel with CI/CD pipeline",
];

const TECH_STACK: [&str; 5] = ["Next.js", "TypeScript", "PostgreSQL", "Prisma", "Tailwind CSS"];

/// Boilerplate plan titled after the first five words of the brief.
pub fn synthesize_plan(brief: &str) -> ArchitecturePlan {
    let title: Vec<&str> = brief.split_whitespace().take(5).collect();

    ArchitecturePlan {
        project_name: format!("{}...", title.join(" ")),
        overview: format!(
            "A comprehensive solution built with modern web technologies to address: {}",
            brief
        ),
        components: COMPONENTS.iter().map(|c| c.to_string()).collect(),
        tech_stack: TECH_STACK.iter().map(|t| t.to_string()).collect(),
        timeline: "MVP ready in 2 weeks with iterative improvements".to_string(),
    }
}
