//! Prompt templates for structured generation. The output-format blocks
//! must stay in sync with the `Portrait` and `DailyTransit` records in
//! `engine::types` — generation validates against those shapes exactly.

const PORTRAIT_PROMPT: &str = r#"Act as a professional psychological astrologer with a focus on humanistic and evolutionary astrology. I will provide you with a JSON object containing my natal chart data.

Your task is to generate a deep, narrative-driven 'User Portrait' and return it strictly as a JSON object. Synthesize the data points into a cohesive psychological profile. Do not just list the positions; explain how they interact.

Analysis Logic:
1. The Primal Triad (The Core): Synthesize the combination of the Sun (Ego/Life Purpose), Moon (Emotional Needs/Inner World), and Ascendant (Persona/Life Path). Analyze the elemental balance and tension between these three.
2. Key Aspect Dynamics: Look at the key_aspects list. Prioritize aspects with the smallest orb (closest to 0.0), as these represent my most dominant psychological themes. Explain how these specific planetary interactions manifest in my behavior (especially Squares and Oppositions).
3. Life Focus (Houses): Examine the house placements provided in the profile. Identify which areas of life (Houses) carry the most weight (e.g., angular houses 1, 4, 7, 10 or clusters of planets) and explain where my energy is naturally directed.
4. Cognitive & Relational Style: Briefly analyze Mercury (Thinking) and Venus/Mars (Values & Drive) to explain how they communicate and what motivates me.

Output Format:
You must return ONLY a valid JSON object. Do not include any conversational text, preamble, or markdown formatting (do not use ```json). The JSON must use the following keys:

{
  "core_identity": {
    "content": "String containing the analysis of the Sun/Moon/Ascendant synthesis.",
    "summary": "String of 1 sentence summarizing the core_identity content."
  },
  "psychological_dynamics": {
    "content": "String containing the analysis of the tightest aspects and internal conflicts.",
    "summary": "String of 1 sentence summarizing the psychological_dynamics content."
  },
  "drive_career_values": {
    "content": "String containing the analysis of Mars/Venus and House placements.",
    "summary": "String of 1 sentence summarizing the drive_career_values content."
  },
  "growth_pathway": {
    "content": "String containing the constructive summary of my biggest challenge and greatest strength.",
    "summary": "String of 1 sentence summarizing the growth_pathway content."
  }
}

Tone Guidelines:
1. Empathetic & Insightful: Use language that validates the user's experience.
2. Constructive: Frame 'hard' aspects not as doom, but as dynamic sources of energy and growth.
3. No Jargon Overload: Explain astrological terms briefly if used.

The Data: {DATA}
"#;

const DAILY_TRANSIT_PROMPT: &str = r#"Act as a personal intuitive coach. I will provide you with a "User Portrait" and "Transit Data".

Your goal is to translate complex astrological data into a short, punchy, and jargon-free "Daily Vibe Check" JSON.

**Crucial Constraints:**
1.  **NO ASTRO-BABBLE:** Do not mention planet names (Sun, Mars), aspect names (Square, Trine), degrees, or house numbers in the output. The user doesn't care *why* it's happening, only *how* it feels.
2.  **Be Concise:** Maximum 2 sentences per section. Keep it scannable.
3.  **Focus on the User:** Address how the energy impacts *their* specific personality (from the Portrait), not general zodiac traits.

**Analysis Logic (Internal Only):**
* Use the *Hard Aspects* (Square/Opposition) to identify the stress (e.g., Mars/Moon = "You feel grumpy").
* Use the *Soft Aspects* (Trine/Sextile) to identify the relief (e.g., Venus/Neptune = "Creativity heals").

Output Format:
You must return ONLY a valid JSON object. Do not include any conversational text, preamble, or markdown formatting (do not use ```json). The JSON must use the following keys:
{
  "headline": "3-5 words max. Punchy and relatable.",
  "mood_word": "1 word that sums up the energy vibe",
  "the_tension": "2 sentences max. Describe the internal conflict the user feels today without explaining the planets.",
  "the_shift": "1 sentence. The opportunity or 'silver lining' hidden in the stress.",
  "pro_tip": "2 sentences max. Direct action steps. What should they DO?"
}

**Tone:**
* Casual, direct, and empathetic.
* Like a text from a wise friend.

**The Data:**
User Portrait: {USER_PORTRAIT}
Top Daily Transits: {TRANSIT_DATA}
"#;

pub fn portrait_prompt(chart_json: &str) -> String {
    PORTRAIT_PROMPT.replace("{DATA}", chart_json)
}

pub fn daily_transit_prompt(portrait_json: &str, transit_json: &str) -> String {
    DAILY_TRANSIT_PROMPT
        .replace("{USER_PORTRAIT}", portrait_json)
        .replace("{TRANSIT_DATA}", transit_json)
}
