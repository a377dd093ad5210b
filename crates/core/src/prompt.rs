use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Name of the timezone dates are resolved in. Asia/Bangkok has no DST, so a
/// fixed offset is exact.
pub const PLANNER_TIMEZONE: &str = "Asia/Bangkok";
const PLANNER_UTC_OFFSET_HOURS: i64 = 7;

pub fn today_in_planner_timezone(now: DateTime<Utc>) -> NaiveDate {
    (now + Duration::hours(PLANNER_UTC_OFFSET_HOURS)).date_naive()
}

pub fn language_instruction(target_language: Option<&str>) -> String {
    match target_language.map(str::trim).filter(|value| !value.is_empty()) {
        Some(language) => format!(
            "The entire JSON output, including all string values (like `task_name` and `subtasks`), \
             must be written in {language}. Use that language consistently."
        ),
        None => "Detect the user's request language automatically and respond in that same language. \
                 The entire JSON output, including all string values (like `task_name` and `subtasks`), \
                 must be in the user's request language. If the request mixes languages, use the predominant language."
            .to_string(),
    }
}

pub fn build_plan_prompt(
    user_text: &str,
    today: NaiveDate,
    target_language: Option<&str>,
) -> String {
    let language = language_instruction(target_language);
    let today_iso = today.format("%Y-%m-%d");

    format!(
        r#"You are a helpful task planner assistant. Your output must be ONLY a single JSON object matching the requested schema, with no other text or explanations.

{language}

Hard constraints:
- This tool ONLY creates structured task plans. If the user's request is not about creating a plan/to-do/tasks, or lacks enough info to make a reasonable plan, DO NOT fabricate. Instead, produce a minimal plan using placeholders and mark missing fields explicitly as "TBD".
- Do not invent dates. If dates are ambiguous, infer conservatively relative to the current date.
- The current date is {today_iso} in the {PLANNER_TIMEZONE} timezone.

Requirements for the plan:
- Interpret natural language time references from the user's request.
- The `start_date` and `end_date` must be in YYYY-MM-DD (ISO) format, and `start_date` must be on or before `end_date`.
- The `priority` must be one of: "Low", "Medium", or "High", based on the urgency and deadline.
- Create between 3 and 10 concise, clear, and actionable subtasks.
- The `subtasks` field must be an array of JSON objects.
- Each object must have:
  - `name`: short subtask title
  - `description`: concise detail of what needs to be done

User's request:
"""{user_text}""""#
    )
}

pub fn build_classifier_prompt(user_text: &str) -> String {
    let user_text = user_text.trim();

    format!(
        r#"You are an intent classifier for the Task Planner API.

Classify the user's request into one of:
- TASK_PLANNING: The user is asking to create a plan/to-do/task schedule with a goal or outcome.
- NOT_TASK_PLANNING: The request is unrelated to creating a plan or tasks.
- INCOMPLETE: The request is too vague/insufficient to create a plan (e.g., missing goal, time window, or important context).
- UNSAFE: The request is inappropriate, e.g., inciting conflict/violence, hate, self-harm/harm to others, illegal activity, or otherwise unsafe.

Rules:
- If NOT_TASK_PLANNING or INCOMPLETE: Do not fabricate details. Downstream should generate a minimal plan with placeholders and mark missing fields as "TBD".
- If UNSAFE: Do not generate any plan/tasks.
- If TASK_PLANNING: Proceed as normal.

Return ONLY a single JSON object with fields: intent, confidence (0..1), reason (short and concise).

User's request:
"""{user_text}""""#
    )
}
