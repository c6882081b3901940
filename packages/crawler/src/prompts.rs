//! Prompt templates for the two extraction schemas.
//!
//! Discovery and profile extraction share one gateway but speak two
//! different schemas; the templates live here so the gateway stays pure
//! transport + failover.

use chat_client::Message;

/// Separator inserted between a profile page's text and the text of the
/// professor's external lab/personal site during deep-dive enrichment.
/// The profile prompt tells the model to prioritize that section.
pub const EXTERNAL_CONTENT_MARKER: &str = "=== EXTERNAL LAB WEBSITE CONTENT ===";

const SYSTEM_DISCOVERY: &str =
    "You are a data extraction assistant. Output valid JSON only.";

const SYSTEM_PROFILE: &str =
    "Output valid JSON only. Extract as much detail as possible.";

/// Messages for the directory/profile-page scan.
pub fn discovery_messages(page_text: &str, url: &str, major: Option<&str>) -> Vec<Message> {
    let major = major.filter(|m| !m.trim().is_empty()).unwrap_or("All Departments");

    let prompt = format!(
        r#"You are extracting RESEARCH FACULTY information from a university webpage.

URL: {url}
Page Content:
{page_text}

FILTER_TOPIC: {major}

YOUR TASK:
1. ANALYZE: Does this page contain RESEARCH FACULTY (professors who conduct research)?
   - GOOD pages: "Faculty Directory", "Our Faculty", "Research Faculty", "People > Faculty"
   - BAD pages: "Leadership", "Administration", "Office of...", "About the Dean"
   - If this page is a single professor's own profile page, set "is_profile_page": true.
   - If this is a LEADERSHIP/ADMIN page: return an empty professors array immediately.

2. EXTRACT only ACTIVE RESEARCH FACULTY. For each person found:
   - name: real full name
   - profile_url: direct link to their individual profile page
   - title: academic title (Professor, Assistant Professor, Associate Professor, Lecturer)
   - email: if visible
   - snippet: brief research description if visible

CRITICAL EXCLUSIONS (do NOT extract these people):
- ADMINISTRATORS: Vice Chancellor, Provost, Dean, Associate Dean, Vice Dean,
  Chancellor, President, Vice President, Director (of office/program), Executive Director
- NON-RESEARCH STAFF: Coordinator, Advisor, Counselor, HR, Administrative Assistant,
  Manager, Specialist, Analyst
- INACTIVE: Alumni, Emeritus, Deceased, "In Memoriam", historical figures
- STUDENTS: Graduate students, PhD candidates, Postdocs, Interns, Fellows
- ORGANIZATIONS: names containing "Lab", "Center", "Institute", "Office", "Program"

OUTPUT FORMAT:
{{
    "is_profile_page": false,
    "professors": [
        {{
            "name": "<REAL_HUMAN_NAME>",
            "profile_url": "<DIRECT_PROFILE_URL>",
            "title": "<ACADEMIC_TITLE>",
            "email": "<EMAIL_IF_FOUND>",
            "snippet": "<RESEARCH_AREA>"
        }}
    ]
}}

If this is a leadership page or NO research faculty found:
{{"is_profile_page": false, "professors": []}}"#
    );

    vec![Message::system(SYSTEM_DISCOVERY), Message::user(prompt)]
}

/// Messages for deep profile extraction and relevance scoring.
pub fn profile_messages(
    page_text: &str,
    url: &str,
    professor_name: &str,
    search_context: Option<&str>,
) -> Vec<Message> {
    let criteria = search_context
        .filter(|c| !c.trim().is_empty())
        .unwrap_or("General academic research relevance");

    let prompt = format!(
        r#"Extract detailed information about this professor from their profile page.

Professor Name: {professor_name}
Profile URL: {url}

Page Content:
{page_text}

NOTE: The content may contain a section marked "{EXTERNAL_CONTENT_MARKER}".
That section comes from the professor's personal lab website or research group
page. PRIORITIZE it for the research summary, for keywords (extract specific
technical terms from it), and for recent news/publications.

TASK:
1. VERIFY STATUS: Is this person ACTIVE faculty?
   - If Deceased, In Memoriam, Emeritus (inactive), or Alumni: return JSON with error.
   - If they are a grad student, staff, or admin: return JSON with error.

2. EXTRACT (if active):
   - title: academic title
   - department: department name
   - school: university name
   - email: email address
   - summary: 3-5 sentence bio
   - keywords: 5-7 research keywords
   - links: array of {{"label": "...", "url": "..."}}

3. SCORING (relevance to user):
   - USER SEARCH GOAL: "{criteria}"
   - match_score: integer 0-100 (100 = perfect match, 0 = irrelevant)
   - match_reasoning: 1 sentence explaining the score.

Return JSON (valid profile):
{{
    "professor_name": "{professor_name}",
    "title": "...",
    "department": "...",
    "school": "...",
    "email": "...",
    "summary": "...",
    "keywords": [...],
    "links": [...],
    "match_score": 85,
    "match_reasoning": "..."
}}

Return JSON (invalid/inactive):
{{
    "error": "Person is deceased/alumni/inactive"
}}"#
    );

    vec![Message::system(SYSTEM_PROFILE), Message::user(prompt)]
}
