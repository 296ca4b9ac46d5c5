// Screening pipeline LLM prompt templates.
// All prompts for CV extraction and match analysis are defined here.

pub const CV_EXTRACTION_SYSTEM: &str = "\
You are a precise CV data extractor. \
Read the attached CV document and return its contents as structured JSON. \
You MUST respond with valid JSON only: no markdown fences, no explanations.";

pub const CV_EXTRACTION_PROMPT: &str = r#"Extract the following information from the attached CV and return it as a JSON object with exactly this structure:

{
  "basicInfo": {
    "fullName": string,                       // first and last name
    "email": string | null,                   // valid email address
    "personalSummary": string | null,         // short professional or educational summary
    "phone": string | null,
    "location": string | null,                // city and/or country
    "topSkills": string[] | null              // the applicant's strongest skills
  },
  "socialInfo": {
    "linkedin": string | null,
    "github": string | null,
    "portfolio": string | null
  } | null,
  "education": [{
    "degree": string,
    "university": string,                     // institution attended
    "startYear": string,
    "graduationYear": string | null
  }] | null,
  "skills": string[],                         // every skill listed; [] if none
  "projects": [{
    "title": string,
    "description": string,
    "technologies": string[],
    "duration": string | null,
    "links": string | null
  }] | null,
  "experience": [{
    "company": string,
    "role": string | null,
    "duration": string | null,
    "responsibilities": string | null
  }] | null,
  "certifications": [{
    "title": string,
    "issuingOrganization": string | null,
    "issueDate": string | null,
    "credentialId": string | null,
    "credentialUrl": string | null
  }] | null,
  "achievements": [{
    "title": string,
    "description": string | null,
    "date": string | null
  }] | null,
  "problemSolving": {
    "numberOfProblemsSolved": integer | null, // e.g. total solved on online judges
    "onlineJudgeProfiles": string[] | null,   // LeetCode, Codeforces, ... profile links
    "notableAchievements": string[] | null    // contests won, rankings, ...
  } | null
}

RULES:
1. "basicInfo.fullName" and "skills" are mandatory.
2. Years and dates are strings exactly as written in the CV.
3. Return ONLY the JSON object, nothing else, no code fences."#;

pub const MATCH_ANALYSIS_SYSTEM: &str = "\
You are an experienced technical recruiter. \
Compare a candidate's structured CV data against a job description and score the fit. \
You MUST respond with valid JSON only: no markdown fences, no explanations.";

pub const MATCH_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the following CV data against the job description and return a JSON object with exactly this structure:

{
  "overallMatch": number,      // overall match between the CV and the job, 0 (no match) to 100 (perfect match)
  "skillsMatch": number,       // match of the CV's skills against the job's requirements, 0 to 100
  "yearOfExperience": number,  // years of professional experience calculated from the CV
  "numOfSkills": number,       // number of skills listed in the CV
  "strengths": string[],       // strengths in the CV that match the job description
  "lackingsArea": string[]     // areas where the CV lacks required skills or experience
}

CV DATA:
{cv_data}

JOB DESCRIPTION:
{job_description}

Return ONLY the JSON object, nothing else, no code fences."#;
