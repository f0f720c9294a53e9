use std::collections::BTreeMap;

use tracing::debug;

use crate::workflows::assessment::campaign::{
    GroupDirectory, GroupId, GroupingMode, TenantContext, TenantId,
};
use crate::workflows::assessment::catalog::{BlockKey, DomainDefinition, QuestionCatalog};
use crate::workflows::assessment::questionnaire::repository::{
    NewResponse, StoreError, StoredResponse,
};
use crate::workflows::assessment::scale::score_for;

use super::actions::ActionLookup;
use super::classify::{Rating, Zone};
use super::tally::{round1, Tally};
use super::views::{
    CampaignResults, DomainDetail, DomainScore, GroupQuestionBreakdown, GroupScore,
    OverallScore, QuestionScore, SkippedAnswers,
};

#[derive(Debug, Clone)]
struct GroupTallies {
    total: Tally,
    questions: Vec<Tally>,
}

#[derive(Debug, Clone)]
struct DomainTallies {
    total: Tally,
    questions: Vec<Tally>,
    groups: BTreeMap<GroupId, GroupTallies>,
}

impl DomainTallies {
    fn new(question_count: usize) -> Self {
        Self {
            total: Tally::default(),
            questions: vec![Tally::default(); question_count],
            groups: BTreeMap::new(),
        }
    }
}

/// Single-pass accumulator. Memory is bounded by domains, groups and
/// questions; responses are observed one at a time and never kept.
#[derive(Debug, Clone)]
pub struct CampaignAggregator<'c> {
    catalog: &'c QuestionCatalog,
    mode: GroupingMode,
    responses: u64,
    domains: BTreeMap<BlockKey, DomainTallies>,
    skipped: SkippedAnswers,
}

impl<'c> CampaignAggregator<'c> {
    pub fn new(catalog: &'c QuestionCatalog, mode: GroupingMode) -> Self {
        let domains = catalog
            .domains()
            .iter()
            .map(|domain| (domain.block, DomainTallies::new(domain.question_count())))
            .collect();

        Self {
            catalog,
            mode,
            responses: 0,
            domains,
            skipped: SkippedAnswers::default(),
        }
    }

    /// Fold one response in. Unknown blocks, answers past the catalog's
    /// question count, and unscored labels are counted and skipped.
    pub fn observe(&mut self, response: &NewResponse) {
        self.responses += 1;
        self.skipped.unknown_blocks += response.answers.unrecognized_keys().count() as u64;
        let group = response.groups.group_for(self.mode);

        for (block, items) in response.answers.blocks() {
            let Some(tallies) = self.domains.get_mut(&block) else {
                self.skipped.unknown_blocks += 1;
                continue;
            };
            let expected = tallies.questions.len();

            for (index, item) in items.iter().enumerate() {
                if index >= expected {
                    self.skipped.beyond_catalog += (items.len() - index) as u64;
                    break;
                }
                let Some(score) = score_for(&item.answer) else {
                    self.skipped.unscored += 1;
                    continue;
                };

                tallies.total.add(score);
                tallies.questions[index].add(score);

                if let Some(group) = group {
                    let group_tallies = tallies.groups.entry(group).or_insert_with(|| GroupTallies {
                        total: Tally::default(),
                        questions: vec![Tally::default(); expected],
                    });
                    group_tallies.total.add(score);
                    group_tallies.questions[index].add(score);
                }
            }
        }
    }

    pub fn responses(&self) -> u64 {
        self.responses
    }

    pub fn skipped(&self) -> SkippedAnswers {
        self.skipped
    }

    /// Turn the running tallies into report views.
    pub fn finish(
        self,
        tenant: TenantId,
        actions: &dyn ActionLookup,
        directory: &dyn GroupDirectory,
    ) -> CampaignResults {
        // Overall and per-group totals are the sums of the per-domain tallies.
        let mut overall = Tally::default();
        let mut group_totals: BTreeMap<GroupId, Tally> = BTreeMap::new();
        for tallies in self.domains.values() {
            overall.merge(&tallies.total);
            for (id, group) in &tallies.groups {
                group_totals.entry(*id).or_default().merge(&group.total);
            }
        }

        let names: BTreeMap<GroupId, String> = group_totals
            .keys()
            .map(|id| {
                let name = directory.group_name(tenant, self.mode, *id);
                (*id, self.mode.display_name(*id, name))
            })
            .collect();
        let name_of = |id: &GroupId| {
            names
                .get(id)
                .cloned()
                .unwrap_or_else(|| self.mode.display_name(*id, None))
        };

        let mut domains = Vec::with_capacity(self.domains.len());
        let mut domain_details = Vec::with_capacity(self.domains.len());
        let mut questions = Vec::new();

        for domain in self.catalog.domains() {
            let Some(tallies) = self.domains.get(&domain.block) else {
                continue;
            };
            let rating = Rating::from_average(tallies.total.average());
            let avg = rounded_average(&tallies.total);
            let percent = rounded_percent(&tallies.total);

            domains.push(DomainScore {
                block: domain.block,
                label: domain.label,
                avg,
                avg_raw: tallies.total.average().unwrap_or(0.0),
                percent,
                rating,
                rating_label: rating.label(),
            });

            let domain_questions: Vec<QuestionScore> = tallies
                .questions
                .iter()
                .enumerate()
                .map(|(index, tally)| question_score(tenant, domain, index, tally, actions))
                .collect();

            let mut groups: Vec<GroupScore> = tallies
                .groups
                .iter()
                .filter(|(_, group)| !group.total.is_empty())
                .map(|(id, group)| group_score(*id, name_of(id), &group.total))
                .collect();
            sort_groups(&mut groups);

            let mut group_questions: Vec<GroupQuestionBreakdown> = tallies
                .groups
                .iter()
                .filter(|(_, group)| !group.total.is_empty())
                .map(|(id, group)| GroupQuestionBreakdown {
                    group_id: *id,
                    name: name_of(id),
                    questions: group
                        .questions
                        .iter()
                        .enumerate()
                        .map(|(index, tally)| {
                            question_score(tenant, domain, index, tally, actions)
                        })
                        .collect(),
                })
                .collect();
            group_questions
                .sort_by(|a, b| a.name.cmp(&b.name).then(a.group_id.cmp(&b.group_id)));

            questions.extend(domain_questions.iter().cloned());
            domain_details.push(DomainDetail {
                block: domain.block,
                label: domain.label,
                avg,
                percent,
                rating,
                rating_label: rating.label(),
                questions: domain_questions,
                groups,
                group_questions,
            });
        }
        questions.sort_by_key(|question| question.number);

        let mut groups: Vec<GroupScore> = group_totals
            .iter()
            .map(|(id, tally)| group_score(*id, name_of(id), tally))
            .collect();
        sort_groups(&mut groups);

        let overall_rating = Rating::from_average(overall.average());

        CampaignResults {
            responses: self.responses,
            group_label: self.mode.group_label(),
            group_label_plural: self.mode.group_label_plural(),
            overall: OverallScore {
                avg: rounded_average(&overall),
                avg_raw: overall.average().unwrap_or(0.0),
                percent: rounded_percent(&overall),
                rating: overall_rating,
                rating_label: overall_rating.label(),
            },
            domains,
            domain_details,
            groups,
            questions,
            skipped: self.skipped,
        }
    }
}

/// Stream a campaign's responses through one aggregator. A store error
/// mid-stream aborts the run; data anomalies never do.
pub fn aggregate<I>(
    catalog: &QuestionCatalog,
    context: &TenantContext,
    responses: I,
    actions: &dyn ActionLookup,
    directory: &dyn GroupDirectory,
) -> Result<CampaignResults, StoreError>
where
    I: IntoIterator<Item = Result<StoredResponse, StoreError>>,
{
    let mut aggregator = CampaignAggregator::new(catalog, context.grouping_mode);
    for response in responses {
        let stored = response?;
        aggregator.observe(&stored.response);
    }

    let skipped = aggregator.skipped();
    debug!(
        tenant = %context.tenant_id,
        responses = aggregator.responses(),
        unknown_blocks = skipped.unknown_blocks,
        beyond_catalog = skipped.beyond_catalog,
        unscored = skipped.unscored,
        "aggregation pass finished"
    );

    Ok(aggregator.finish(context.tenant_id, actions, directory))
}

fn rounded_average(tally: &Tally) -> f64 {
    tally.average().map(round1).unwrap_or(0.0)
}

fn rounded_percent(tally: &Tally) -> f64 {
    tally.percent().map(round1).unwrap_or(0.0)
}

fn question_score(
    tenant: TenantId,
    domain: &DomainDefinition,
    index: usize,
    tally: &Tally,
    actions: &dyn ActionLookup,
) -> QuestionScore {
    let number = domain.question_number(index);
    let zone = Zone::from_percent(tally.percent());
    let recommended = actions.get(tenant, number);

    QuestionScore {
        number,
        text: domain.questions.get(index).copied().unwrap_or_default(),
        domain: domain.label,
        avg_raw: tally.average().unwrap_or(0.0),
        avg: rounded_average(tally),
        percent: rounded_percent(tally),
        answers: tally.count,
        zone,
        zone_label: zone.label(),
        actions: recommended.actions,
        trigger_below: recommended.trigger_below,
    }
}

fn group_score(group_id: GroupId, name: String, tally: &Tally) -> GroupScore {
    let zone = Zone::from_percent(tally.percent());
    GroupScore {
        group_id,
        name,
        avg: rounded_average(tally),
        percent: rounded_percent(tally),
        zone,
        zone_label: zone.label(),
    }
}

fn sort_groups(groups: &mut [GroupScore]) {
    groups.sort_by(|a, b| a.name.cmp(&b.name).then(a.group_id.cmp(&b.group_id)));
}
