//! Fixed instructions and user templates for the three model-backed stages.
//!
//! System instructions containing `{output_language}` are rendered once when a stage is built;
//! user templates are rendered per call.

/// Default language paraphrases and summaries are written in.
pub const DEFAULT_OUTPUT_LANGUAGE: &str = "Korean";

/// System instruction for reference extraction.
pub const EXTRACTION_SYSTEM: &str = r#"
You are an expert in extracting table names and column names from SQL queries.
From the provided SQL query, extract all table names and column names used for SELECT, WHERE, and JOIN clauses, excluding asterisks ("*").
Ensure that the response is in a valid JSON format that can be parsed directly.
Skip the preamble and only provide the answer in a JSON document:

{
  "table": ["table1", "table2", ...],
  "column": ["col1", "col2", ...]
}

<example>
SQL:
SELECT * from LOGIS_ADMIN.IAWD_TB_DCBSCD_BASISLC_M
where basis_lclsf_cd_nm like '%reservation%'
LIMIT 200;

{
  "table": ["IAWD_TB_DCBSCD_BASISLC_M"],
  "column": ["basis_lclsf_cd_nm"]
}
</example>
"#;

/// User template for reference extraction.
pub const EXTRACTION_USER: &str = "\nSQL: {sql}\n";

/// System instruction for query paraphrasing.
pub const PARAPHRASE_SYSTEM: &str = r#"
You are an SQL expert who can understand the intent behind a given SQL query.
Translate the SQL query into a natural language request in {output_language} that a real user might make.

- Keep your translation concise and conversational, mimicking how an actual user would ask for the information sought by the query.
- Do not reference the <description> section directly and do not use a question form.
- Ensure to include all conditions specified in the SQL query in the request.
- Write possible business and functional purposes of the query.
- Skip the preamble and phrase only the natural language request as a single declarative statement.

<example>
SQL: SELECT count(*)
from IAWB_TB_DCTRTR_TR_M
where work_dt = '20240522'
Query to retrieve the count of products processed on May 22, 2024.
</example>
"#;

/// User template for query paraphrasing.
pub const PARAPHRASE_USER: &str = "\n<description>\n{description}\n</description>\n\nSQL: {sql}\n";

/// System instruction for table summarization.
pub const SUMMARY_SYSTEM: &str = r#"
You are a data analyst that can help summarize SQL tables.
Summarize the provided table by the given context.

<instruction>
- You shall write the summary based only on the provided information, and make it as detailed as possible.
- Note that the sampled queries are only a small sample of queries and thus not all possible uses of the table are represented, and only some columns in the table are used.
- Do not use any adjective to describe the table. For example, the importance of the table, its comprehensiveness or if it is crucial, or who may be using it. You can say that a table contains certain types of data, but you cannot say that the table contains a 'wealth' of data, or that it is 'comprehensive'.
- Do not mention the sampled queries. Only talk objectively about the type of data the table contains and its possible utilities.
- Include some potential use cases of the table, e.g. what kind of questions can be answered by the table and what kind of analysis can be done with it.
- Provide the output in {output_language}.
</instruction>
"#;

/// User template for table summarization.
pub const SUMMARY_USER: &str =
    "\n<table schema>\n{table_schema}\n</table schema>\n\n<sample queries>\n{sample_queries}\n</sample queries>\n";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::PromptTemplate;

    #[test]
    fn system_instructions_render_with_language() {
        for system in [PARAPHRASE_SYSTEM, SUMMARY_SYSTEM] {
            let rendered = PromptTemplate::new(system)
                .render(&[("output_language", "English")])
                .expect("render");
            assert!(rendered.contains("English"));
            assert!(!rendered.contains("{output_language}"));
        }
    }

    #[test]
    fn extraction_instruction_keeps_its_json_example() {
        let rendered = PromptTemplate::new(EXTRACTION_SYSTEM)
            .render(&[])
            .expect("no placeholders");
        assert_eq!(rendered, EXTRACTION_SYSTEM);
    }
}
