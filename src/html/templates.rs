//! Description and acceptance-criteria templates.

use super::acceptance::{criteria_body, reference_html, TESTING_REQUIREMENTS_HEADING};
use super::resources::{list_items, render_resources};
use super::{escape, escape_opt, link};
use crate::audit::{
    CustomCriteria, CustomCriteriaLookup, Finding, ReportDetails, ResourceLookup, TestingAccount,
};

const AUTHOR_CHECKLIST: &str = "Please check the following (and delete this list when you're done!):\
<ul>\
<li>Combine any easily combine-able work into one PBI, rather than making them separate work items.</li>\
<li>Please keep your PBI scope to an 8 effort or lower, if possible.</li>\
<li>Check your tags! Aside from generated tags, you should add a tag for the site that was tested, e.g. WSS</li>\
<li>If your PBI needs a predecessor research PBI, create one and add the tags Spike, [Page Name] Page, Ready for Refinement. Then relate it to this PBI as a Predecessor!</li>\
</ul>";

const GROUPED_TODO_ITEM: &str = "<li><ul><li><strong>TODO</strong>: \
[ENTER CUSTOM TESTING REQUIREMENTS FOR THIS DESCRIPTION ITEM]</li></ul></li>";

/// Page-level values shared by every work item from one report, already
/// escaped.
#[derive(Debug, Clone)]
pub struct PageContext {
    name: String,
    url: String,
    testing_account: String,
}

impl PageContext {
    pub fn new(details: &ReportDetails) -> Self {
        Self {
            name: escape(&details.page_name),
            url: escape(&details.page_url),
            testing_account: testing_account_html(details.testing_account.as_ref()),
        }
    }

    fn reference_item(&self) -> String {
        format!(
            "<li><a href=\"{}\">Reference page</a>{}</li>",
            self.url, self.testing_account
        )
    }

    fn visit_page_item(&self) -> String {
        format!(
            "<ul><li>Visit the <a href=\"{}\">{} page</a></li><li>[List testing steps]</li></ul>",
            self.url, self.name
        )
    }
}

pub fn testing_account_html(account: Option<&TestingAccount>) -> String {
    let Some(account) = account else {
        return String::new();
    };
    let login = match (account.url.as_deref(), account.text.as_deref()) {
        (Some(url), text) => link(url, text.unwrap_or("this account")),
        (None, Some(text)) => escape(text),
        (None, None) => return String::new(),
    };
    format!("<ul><li>Log in with {}</li></ul>", login)
}

/// Escaped content of one finding, ready to drop into a template.
#[derive(Debug, Clone, Default)]
pub struct FindingSummary {
    pub recommendation: String,
    pub notes: String,
    pub remediation: String,
    pub description: String,
    /// Rendered resource fragments (links or text), not yet wrapped in `<li>`.
    pub resources: Vec<String>,
    pub criteria: Option<CustomCriteria>,
}

impl FindingSummary {
    pub fn new(
        finding: &Finding,
        resources: &ResourceLookup,
        criteria: &CustomCriteriaLookup,
    ) -> Self {
        Self {
            recommendation: escape_opt(finding.recommendation.as_deref()),
            notes: escape_opt(finding.notes.as_deref()),
            remediation: escape_opt(finding.remediation.as_deref()),
            description: escape_opt(finding.description.as_deref()),
            resources: render_resources(&finding.resources, resources),
            criteria: criteria
                .get(finding.notes.as_deref(), finding.remediation.as_deref())
                .cloned(),
        }
    }
}

fn single_remediation(summary: &FindingSummary) -> String {
    let mut html = format!("<li>{}</li>", summary.remediation);
    if !summary.description.is_empty() {
        html.push_str(&format!(
            "<li>Additional information: {}</li>",
            summary.description
        ));
    }
    html
}

pub fn single_description(page: &PageContext, summary: &FindingSummary) -> String {
    format!(
        "{checklist}\
<h1>PBI Goal</h1>\
<p>Update the {name} page's [general description of component update to be made] ...</p><br />\
<ul>\
{reference}\
<li>{recommendation}</li>\
<li>{notes}</li>\
<ul>{remediation}</ul>\
<li>Resources:<ul>{resources}</ul></li>\
</ul><br />\
<p>This change is important because [why this matters for users]</p>",
        checklist = AUTHOR_CHECKLIST,
        name = page.name,
        reference = page.reference_item(),
        recommendation = summary.recommendation,
        notes = summary.notes,
        remediation = single_remediation(summary),
        resources = list_items(&summary.resources),
    )
}

fn grouped_remediations(entries: &[FindingSummary]) -> String {
    let mut html = String::from("<ol>");
    for entry in entries {
        html.push_str("<li>");
        html.push_str(&format!(
            "<strong>Conformance Recommendation:</strong> {}<br>",
            entry.recommendation
        ));
        html.push_str(&format!("<strong>Notes:</strong> {}<br>", entry.notes));
        html.push_str(&format!(
            "<strong>Remediation:</strong> {}<br>",
            entry.remediation
        ));
        if !entry.description.is_empty() {
            html.push_str(&format!(
                "<strong>Additional Information:</strong> {}<br>",
                entry.description
            ));
        }
        if !entry.resources.is_empty() {
            html.push_str(&format!(
                "<strong>Resources:</strong><ul>{}</ul>",
                list_items(&entry.resources)
            ));
        }
        html.push_str("</li>");
    }
    html.push_str("</ol>");
    html
}

pub fn grouped_description(page: &PageContext, entries: &[FindingSummary]) -> String {
    format!(
        "<h1>PBI Goal</h1>\
<p>Update the {name} page's [general description of component update to be made] ...</p><br />\
<ul>\
{reference}\
<ul>{remediations}</ul>\
</ul><br />\
<p>These changes are important because [why this matters for users]</p>",
        name = page.name,
        reference = page.reference_item(),
        remediations = grouped_remediations(entries),
    )
}

pub fn default_acceptance_criteria(page: &PageContext) -> String {
    let visit = page.visit_page_item();
    format!(
        "{heading}\
<ul><li>Keyboard</li>\
<li>Screen Reader</li>\
<li>HTML</li>\
<li>etc. add any other kinds of testing you might need and remove those you don't!</li></ul>\
<h2>Keyboard Testing</h2>{visit}\
<h2>Screen Reader Testing</h2>{visit}\
<h2>HTML</h2>{visit}",
        heading = TESTING_REQUIREMENTS_HEADING,
        visit = visit,
    )
}

/// One numbered item per group member, mirroring the description's
/// numbering; members without custom criteria get a TODO placeholder.
pub fn grouped_acceptance_criteria(entries: &[FindingSummary]) -> String {
    let mut html = format!(
        "{}<p><em>Each numbered item below corresponds to the same numbered item \
in the Description section above.</em></p><ol>",
        TESTING_REQUIREMENTS_HEADING
    );

    for entry in entries {
        match &entry.criteria {
            Some(criteria) => html.push_str(&format!(
                "<li>{}{}</li>",
                criteria_body(&criteria.text),
                reference_html(criteria)
            )),
            None => html.push_str(GROUPED_TODO_ITEM),
        }
    }

    html.push_str("</ol>");
    html
}
