//! Section catalog
//!
//! Immutable table of the eight analysis tasks. Each entry pairs a display
//! name with the key its section is stored under and a pure prompt builder.
//! The executive summary is deliberately absent: it depends on the others.

use crate::questionnaire::QuestionnaireInput;

/// One analysis dimension of the plan.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    /// Display name, also reported in progress events
    pub name: &'static str,
    /// Key the section is stored under; unique across the catalog
    pub result_key: &'static str,
    /// Renders the instructions sent to the model
    pub build_prompt: fn(&QuestionnaireInput) -> String,
}

impl TaskSpec {
    pub fn prompt(&self, input: &QuestionnaireInput) -> String {
        (self.build_prompt)(input)
    }
}

/// Display name used for the dependent summary stage.
pub const EXECUTIVE_SUMMARY_NAME: &str = "Executive Summary";
/// Key the executive summary is reported under.
pub const EXECUTIVE_SUMMARY_KEY: &str = "executiveSummary";

static CATALOG: [TaskSpec; 8] = [
    TaskSpec {
        name: "Market Research",
        result_key: "marketAnalysis",
        build_prompt: market_research,
    },
    TaskSpec {
        name: "Competitor Analysis",
        result_key: "competitiveAnalysis",
        build_prompt: competitor_analysis,
    },
    TaskSpec {
        name: "Customer Personas",
        result_key: "customerAnalysis",
        build_prompt: customer_personas,
    },
    TaskSpec {
        name: "Financial Model",
        result_key: "financialProjections",
        build_prompt: financial_model,
    },
    TaskSpec {
        name: "Go-to-Market",
        result_key: "marketingStrategy",
        build_prompt: go_to_market,
    },
    TaskSpec {
        name: "Operations",
        result_key: "operationsPlan",
        build_prompt: operations,
    },
    TaskSpec {
        name: "Risk Assessment",
        result_key: "riskAnalysis",
        build_prompt: risk_assessment,
    },
    TaskSpec {
        name: "Legal & Compliance",
        result_key: "legalCompliance",
        build_prompt: legal_compliance,
    },
];

/// All section tasks, in presentation order.
pub fn list() -> &'static [TaskSpec] {
    &CATALOG
}

fn market_research(data: &QuestionnaireInput) -> String {
    format!(
        r#"You are a market research analyst. Analyze the market for this business:

Business: {description}
Business Model: {model}
Target Market: {market}
Location: {location}

Provide a comprehensive market analysis including:
1. Industry Overview - Current state and trends
2. Market Size - TAM (Total Addressable Market), SAM (Serviceable), SOM (Obtainable)
3. Growth Trends - Industry growth rate and projections
4. Market Drivers - Key factors driving growth
5. Challenges - Potential headwinds

Return as JSON with structure:
{{
  "industryOverview": "string",
  "marketSize": {{ "tam": "string", "sam": "string", "som": "string" }},
  "growthRate": "string",
  "trends": ["string"],
  "drivers": ["string"],
  "challenges": ["string"],
  "confidence": 0.0-1.0
}}"#,
        description = data.business_description,
        model = data.business_model,
        market = data.target_market,
        location = data.location_line(),
    )
}

fn competitor_analysis(data: &QuestionnaireInput) -> String {
    format!(
        r#"You are a competitive intelligence analyst. Analyze competitors for this business:

Business: {description}
Business Model: {model}
Location: {location}
Unique Advantage: {advantage}

Provide comprehensive competitive analysis:
1. Direct Competitors - Similar businesses in the space
2. Indirect Competitors - Alternative solutions
3. Competitive Positioning - Where this business fits
4. Differentiation Strategy - How to stand out
5. SWOT Analysis

Return as JSON:
{{
  "directCompetitors": [{{ "name": "string", "strengths": ["string"], "weaknesses": ["string"] }}],
  "indirectCompetitors": ["string"],
  "positioning": "string",
  "differentiators": ["string"],
  "swot": {{ "strengths": [], "weaknesses": [], "opportunities": [], "threats": [] }},
  "confidence": 0.0-1.0
}}"#,
        description = data.business_description,
        model = data.business_model,
        location = data.location_line(),
        advantage = data.unique_advantage_or_default(),
    )
}

fn customer_personas(data: &QuestionnaireInput) -> String {
    format!(
        r#"You are a customer research specialist. Create detailed customer personas for:

Business: {description}
Target Market: {market}
Business Model: {model}

Create 2-3 detailed customer personas including:
1. Demographics - Age, income, location, profession
2. Psychographics - Values, interests, lifestyle
3. Pain Points - Problems they face
4. Goals - What they're trying to achieve
5. Buying Behavior - How they make purchase decisions
6. Jobs to Be Done - Tasks they hire products/services for

Return as JSON:
{{
  "personas": [
    {{
      "name": "string (descriptive name like 'Busy Professional Parent')",
      "demographics": {{ "age": "string", "income": "string", "location": "string", "profession": "string" }},
      "psychographics": ["string"],
      "painPoints": ["string"],
      "goals": ["string"],
      "buyingBehavior": "string",
      "jobsToBeDone": ["string"]
    }}
  ],
  "confidence": 0.0-1.0
}}"#,
        description = data.business_description,
        market = data.target_market,
        model = data.business_model,
    )
}

fn financial_model(data: &QuestionnaireInput) -> String {
    format!(
        r#"You are a financial analyst. Create financial projections for:

Business: {description}
Business Model: {model}
Investment Level: {investment}
Timeline: {timeline}
Location: {location}

Provide 3-year financial projections including:
1. Startup Costs - Initial investment breakdown
2. Revenue Projections - Year 1, 2, 3
3. Operating Expenses - Monthly/annual costs
4. Unit Economics - Revenue per customer, CAC, LTV
5. Break-even Analysis
6. Funding Requirements

Return as JSON:
{{
  "startupCosts": {{ "total": "string", "breakdown": [{{ "item": "string", "cost": "string" }}] }},
  "revenueProjections": {{ "year1": "string", "year2": "string", "year3": "string" }},
  "operatingExpenses": {{ "monthly": "string", "breakdown": [{{ "item": "string", "cost": "string" }}] }},
  "unitEconomics": {{ "revenuePerCustomer": "string", "cac": "string", "ltv": "string", "ltvCacRatio": "string" }},
  "breakeven": {{ "timeline": "string", "unitsRequired": "string" }},
  "fundingNeeds": "string",
  "confidence": 0.0-1.0
}}"#,
        description = data.business_description,
        model = data.business_model,
        investment = data.investment_level_or_default(),
        timeline = data.timeline_or_default(),
        location = data.location_line(),
    )
}

fn go_to_market(data: &QuestionnaireInput) -> String {
    format!(
        r#"You are a marketing strategist. Create a go-to-market strategy for:

Business: {description}
Target Market: {market}
Business Model: {model}
Location: {location}
Investment Level: {investment}

Provide comprehensive marketing strategy:
1. Brand Positioning - Core message and value proposition
2. Marketing Channels - Prioritized channels for customer acquisition
3. Content Strategy - Types of content to create
4. Launch Plan - First 90 days
5. Customer Acquisition - Tactics and estimated costs
6. Retention Strategy - How to keep customers

Return as JSON:
{{
  "positioning": "string",
  "valueProposition": "string",
  "channels": [{{ "channel": "string", "priority": "high/medium/low", "tactics": ["string"] }}],
  "contentStrategy": ["string"],
  "launchPlan": {{ "week1": "string", "week2_4": "string", "month2_3": "string" }},
  "acquisitionCost": "string",
  "retentionStrategy": ["string"],
  "confidence": 0.0-1.0
}}"#,
        description = data.business_description,
        market = data.target_market,
        model = data.business_model,
        location = data.location_line(),
        investment = data.investment_level_or_default(),
    )
}

fn operations(data: &QuestionnaireInput) -> String {
    format!(
        r#"You are an operations consultant. Create an operations plan for:

Business: {description}
Business Model: {model}
Location: {location}
Timeline: {timeline}

Provide detailed operations plan:
1. Key Activities - Core business activities
2. Key Resources - What you need to operate
3. Key Partnerships - Vendors, suppliers, partners
4. Technology Stack - Tools and systems needed
5. Processes - Key operational processes
6. Quality Control - How to maintain quality
7. Scaling Plan - How operations scale with growth

Return as JSON:
{{
  "keyActivities": ["string"],
  "keyResources": {{ "physical": ["string"], "human": ["string"], "financial": ["string"], "intellectual": ["string"] }},
  "partnerships": [{{ "type": "string", "purpose": "string" }}],
  "technology": ["string"],
  "processes": [{{ "name": "string", "description": "string" }}],
  "qualityControl": ["string"],
  "scalingPlan": "string",
  "confidence": 0.0-1.0
}}"#,
        description = data.business_description,
        model = data.business_model,
        location = data.location_line(),
        timeline = data.timeline_or_default(),
    )
}

fn risk_assessment(data: &QuestionnaireInput) -> String {
    format!(
        r#"You are a risk analyst. Assess risks for:

Business: {description}
Business Model: {model}
Location: {location}
Investment Level: {investment}

Identify and assess risks:
1. Market Risks - Market acceptance, competition
2. Financial Risks - Cash flow, funding
3. Operational Risks - Execution challenges
4. Regulatory Risks - Legal/compliance issues
5. Technology Risks - Technical challenges
6. Mitigation Strategies - How to address each risk

Return as JSON:
{{
  "risks": [
    {{
      "category": "string",
      "risk": "string",
      "likelihood": "high/medium/low",
      "impact": "high/medium/low",
      "mitigation": "string"
    }}
  ],
  "topRisks": ["string"],
  "contingencyPlans": ["string"],
  "confidence": 0.0-1.0
}}"#,
        description = data.business_description,
        model = data.business_model,
        location = data.location_line(),
        investment = data.investment_level_or_default(),
    )
}

fn legal_compliance(data: &QuestionnaireInput) -> String {
    format!(
        r#"You are a business legal consultant. Provide legal/compliance guidance for:

Business: {description}
Business Model: {model}
Location: {location}

Cover these areas:
1. Business Structure - Recommended entity type (LLC, Corp, etc.)
2. Licenses & Permits - Required registrations
3. Industry Regulations - Specific compliance requirements
4. Contracts Needed - Key legal documents
5. Insurance - Required/recommended coverage
6. Intellectual Property - Trademark, patent considerations

Return as JSON:
{{
  "recommendedStructure": {{ "type": "string", "reasoning": "string" }},
  "licensesPermits": [{{ "name": "string", "description": "string", "cost": "string" }}],
  "regulations": ["string"],
  "contractsNeeded": ["string"],
  "insurance": [{{ "type": "string", "purpose": "string" }}],
  "intellectualProperty": ["string"],
  "disclaimer": "This is general guidance, not legal advice. Consult an attorney.",
  "confidence": 0.0-1.0
}}"#,
        description = data.business_description,
        model = data.business_model,
        location = data.location_line(),
    )
}
